//! Navigators: lift a predicate onto structurally related nodes.
//!
//! Child navigators look one level down. Ancestor navigators follow a
//! caller-supplied step function, so any parent relation works (semantic or
//! lexical parent, or something else entirely).

use crate::node::Node;
use std::iter::FusedIterator;

/// Step function following [`Node::semantic_parent`].
pub fn semantic_parent<N: Node>(node: &N) -> Option<N> {
    node.semantic_parent()
}

/// Step function following [`Node::lexical_parent`].
pub fn lexical_parent<N: Node>(node: &N) -> Option<N> {
    node.lexical_parent()
}

/// True when at least one direct child satisfies `predicate`.
pub fn any_child<N, P>(predicate: P) -> impl Fn(&N) -> bool
where
    N: Node,
    P: Fn(&N) -> bool,
{
    move |node: &N| node.children().any(|child| predicate(&child))
}

/// True when every direct child satisfies `predicate` (vacuously true for leaves).
pub fn all_children<N, P>(predicate: P) -> impl Fn(&N) -> bool
where
    N: Node,
    P: Fn(&N) -> bool,
{
    move |node: &N| node.children().all(|child| predicate(&child))
}

/// True when some node of the chain `step(n)`, `step(step(n))`, ... satisfies
/// `predicate`. The node itself is not part of the chain.
pub fn any_predecessor<N, S, P>(step: S, predicate: P) -> impl Fn(&N) -> bool
where
    N: Node,
    S: Fn(&N) -> Option<N>,
    P: Fn(&N) -> bool,
{
    move |node: &N| predecessors(node, &step).any(|ancestor| predicate(&ancestor))
}

/// True when the node itself and every node of the chain `step(n)`,
/// `step(step(n))`, ... satisfy `predicate`, up to and including the last node
/// `step` yields.
///
/// The chain must end in a node the predicate accepts, so a terminal test such
/// as [`is_translation_unit`](crate::predicates::is_translation_unit) is
/// usually part of `predicate`.
pub fn all_predecessors<N, S, P>(step: S, predicate: P) -> impl Fn(&N) -> bool
where
    N: Node,
    S: Fn(&N) -> Option<N>,
    P: Fn(&N) -> bool,
{
    move |node: &N| {
        predicate(node) && predecessors(node, &step).all(|ancestor| predicate(&ancestor))
    }
}

/// Iterate the ancestor chain of `node` defined by `step`.
///
/// The chain stops when `step` yields nothing or yields a node already
/// produced (or the start node itself); the latter is reported as a warning.
pub fn predecessors<'s, N, S>(node: &N, step: &'s S) -> Predecessors<'s, N, S>
where
    N: Node,
    S: Fn(&N) -> Option<N>,
{
    Predecessors {
        step,
        next: step(node),
        seen: vec![node.clone()],
    }
}

pub struct Predecessors<'s, N, S> {
    step: &'s S,
    next: Option<N>,
    seen: Vec<N>,
}

impl<'s, N, S> Iterator for Predecessors<'s, N, S>
where
    N: Node,
    S: Fn(&N) -> Option<N>,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.next.take()?;
        if self.seen.contains(&node) {
            tracing::warn!(
                kind = %node.kind(),
                spelling = node.spelling(),
                depth = self.seen.len(),
                "ancestor chain revisits a node; stopping"
            );
            return None;
        }
        self.next = (self.step)(&node);
        self.seen.push(node.clone());
        Some(node)
    }
}

impl<'s, N, S> FusedIterator for Predecessors<'s, N, S>
where
    N: Node,
    S: Fn(&N) -> Option<N>,
{
}
