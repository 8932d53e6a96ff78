//! Predicates over a single node's own attributes.
//!
//! Absent attributes (no type, no location) make a predicate answer `false`.

use crate::node::{AccessSpecifier, CursorKind, Node, Type};
use crate::predicates::errors::PredicateError;
use regex::Regex;
use std::collections::HashSet;

/// Class, struct or union declaration, forward declarations included.
///
/// Class template patterns are a separate category, see [`is_class_template`].
pub fn is_class<N: Node>(node: &N) -> bool {
    matches!(
        node.kind(),
        CursorKind::ClassDecl | CursorKind::StructDecl | CursorKind::UnionDecl
    )
}

/// Like [`is_class`] but only the declaration that carries a body.
pub fn is_class_definition<N: Node>(node: &N) -> bool {
    is_class(node) && node.is_definition()
}

pub fn is_class_template<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::ClassTemplate
}

/// Free (non-member) function.
pub fn is_function<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::FunctionDecl
}

/// Member function. Constructors and destructors are not methods.
pub fn is_method<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::CxxMethod
}

pub fn is_enum<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::EnumDecl
}

pub fn is_namespace<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::Namespace
}

pub fn is_translation_unit<N: Node>(node: &N) -> bool {
    node.kind() == CursorKind::TranslationUnit
}

pub fn is_definition<N: Node>(node: &N) -> bool {
    node.is_definition()
}

pub fn is_public<N: Node>(node: &N) -> bool {
    node.access() == AccessSpecifier::Public
}

pub fn is_protected<N: Node>(node: &N) -> bool {
    node.access() == AccessSpecifier::Protected
}

pub fn is_private<N: Node>(node: &N) -> bool {
    node.access() == AccessSpecifier::Private
}

/// Predicate for an arbitrary access level.
pub fn has_access<N: Node>(level: AccessSpecifier) -> impl Fn(&N) -> bool + Clone + Send + Sync {
    move |node: &N| node.access() == level
}

/// Predicate for an arbitrary cursor kind.
pub fn has_kind<N: Node>(kind: CursorKind) -> impl Fn(&N) -> bool + Clone + Send + Sync {
    move |node: &N| node.kind() == kind
}

/// Build a predicate matching node spellings against a regular expression.
///
/// The pattern must match the whole spelling: `f` accepts `f` but neither
/// `f1` nor `xf`.
pub fn make_name_matcher<N: Node>(
    pattern: &str,
) -> Result<impl Fn(&N) -> bool + Clone + Send + Sync, PredicateError> {
    let regex = compile_anchored(pattern)?;
    Ok(move |node: &N| regex.is_match(node.spelling()))
}

/// Test one node against a name pattern immediately.
pub fn matches_name<N: Node>(pattern: &str, node: &N) -> Result<bool, PredicateError> {
    Ok(compile_anchored(pattern)?.is_match(node.spelling()))
}

fn compile_anchored(pattern: &str) -> Result<Regex, PredicateError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| PredicateError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Node whose type spelling, fully qualified, equals `qualified_name`.
pub fn match_typename<N: Node>(
    qualified_name: impl Into<String>,
) -> impl Fn(&N) -> bool + Clone + Send + Sync {
    let qualified_name = qualified_name.into();
    move |node: &N| node.ty().is_some_and(|ty| ty.spelling == qualified_name)
}

/// Node with a source location in a named file.
pub fn has_location<N: Node>(node: &N) -> bool {
    node.location()
        .is_some_and(|location| !location.file.as_os_str().is_empty())
}

/// Node declared in one of the given files, compared by base name.
pub fn is_in_file<N, I, S>(file_names: I) -> impl Fn(&N) -> bool + Clone + Send + Sync
where
    N: Node,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let file_names: HashSet<String> = file_names.into_iter().map(Into::into).collect();
    move |node: &N| node.file_name().is_some_and(|name| file_names.contains(name))
}

/// Built-in scalar type (`int`, `void`, `const double`, ...).
pub fn is_primitive(ty: &Type) -> bool {
    ty.kind.is_builtin()
}
