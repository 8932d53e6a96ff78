//! Boolean algebra over predicates.

/// A type-erased predicate, for lists mixing different predicate types.
pub type BoxPredicate<'a, N> = Box<dyn Fn(&N) -> bool + Send + Sync + 'a>;

/// Erase a predicate's concrete type.
pub fn boxed<'a, N, P>(predicate: P) -> BoxPredicate<'a, N>
where
    P: Fn(&N) -> bool + Send + Sync + 'a,
{
    Box::new(predicate)
}

/// Logical AND over any number of predicates.
///
/// Stops at the first predicate that rejects the node. An empty list accepts
/// every node.
pub fn all_fn<'a, N, I>(predicates: I) -> impl Fn(&N) -> bool + Send + Sync + 'a
where
    I: IntoIterator<Item = BoxPredicate<'a, N>>,
    N: 'a,
{
    let predicates: Vec<BoxPredicate<'a, N>> = predicates.into_iter().collect();
    move |node: &N| predicates.iter().all(|predicate| predicate(node))
}

/// Logical OR over any number of predicates.
///
/// Stops at the first predicate that accepts the node. An empty list rejects
/// every node.
pub fn any_fn<'a, N, I>(predicates: I) -> impl Fn(&N) -> bool + Send + Sync + 'a
where
    I: IntoIterator<Item = BoxPredicate<'a, N>>,
    N: 'a,
{
    let predicates: Vec<BoxPredicate<'a, N>> = predicates.into_iter().collect();
    move |node: &N| predicates.iter().any(|predicate| predicate(node))
}

/// Logical negation.
pub fn not_fn<N, P>(predicate: P) -> impl Fn(&N) -> bool
where
    P: Fn(&N) -> bool,
{
    move |node: &N| !predicate(node)
}

/// Conjunction of heterogeneous predicates.
///
/// ```
/// use glud::predicates::{is_class_definition, is_public};
/// use glud::{all_of, walk};
///
/// let unit = glud::cpp::parse_source("tmp.cpp", "struct A { struct B {}; };")?;
/// let public_class = all_of![is_class_definition, is_public];
/// assert_eq!(walk(&public_class, unit.cursor()).count(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[macro_export]
macro_rules! all_of {
    ($($predicate:expr),* $(,)?) => {
        $crate::predicates::all_fn(::std::vec![$($crate::predicates::boxed($predicate)),*])
    };
}

/// Disjunction of heterogeneous predicates.
#[macro_export]
macro_rules! any_of {
    ($($predicate:expr),* $(,)?) => {
        $crate::predicates::any_fn(::std::vec![$($crate::predicates::boxed($predicate)),*])
    };
}
