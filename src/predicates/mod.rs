//! Predicates over [`Node`](crate::node::Node)s.
//!
//! A predicate is any `Fn(&N) -> bool`. Leaf predicates test one attribute of
//! a single node, the algebra combines predicates with AND/OR, and navigators
//! retarget a predicate onto children or ancestors. Every combinator returns
//! an ordinary predicate again, so they nest freely.

pub mod algebra;
pub mod errors;
pub mod leaf;
pub mod navigate;

pub use algebra::{all_fn, any_fn, boxed, not_fn, BoxPredicate};
pub use errors::PredicateError;
pub use leaf::{
    has_access, has_kind, has_location, is_class, is_class_definition, is_class_template,
    is_definition, is_enum, is_function, is_in_file, is_method, is_namespace, is_primitive,
    is_private, is_protected, is_public, is_translation_unit, make_name_matcher, match_typename,
    matches_name,
};
pub use navigate::{
    all_children, all_predecessors, any_child, any_predecessor, lexical_parent, predecessors,
    semantic_parent, Predecessors,
};
