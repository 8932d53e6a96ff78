//! glud: composable predicates over C++ syntax trees
//!
//! Queries are plain boolean functions over tree nodes. Small leaf predicates
//! test one attribute of a node, the algebra combines them, navigators lift
//! them onto children or ancestors, and a lazy depth-first walker yields the
//! nodes of a subtree that satisfy the result.
//!
//! # Architecture
//!
//! The core ([`node`], [`predicates`], [`walk()`]) only consumes the [`Node`]
//! trait and never parses, mutates or caches anything. The [`cpp`] module
//! supplies a concrete tree: C++ source parsed with tree-sitter and lowered
//! into libclang-shaped cursors. [`config`] turns TOML query files into
//! predicates, and [`display`] renders subtrees for inspection.
//!
//! # Example
//!
//! ```
//! use glud::predicates::{any_child, is_class_definition, is_method, is_public};
//! use glud::{all_of, walk, Node};
//!
//! let unit = glud::cpp::parse_source(
//!     "tmp.cpp",
//!     "class A { public: void f(); }; class B { void g(); };",
//! )?;
//! let with_public_method = all_of![
//!     is_class_definition,
//!     any_child(all_of![is_method, is_public]),
//! ];
//! let names: Vec<_> = walk(&with_public_method, unit.cursor())
//!     .map(|c| c.spelling().to_string())
//!     .collect();
//! assert_eq!(names, vec!["A"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod cpp;
pub mod display;
pub mod node;
pub mod pool;
pub mod predicates;
pub mod walk;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, QueryConfig, QueryExpr};
pub use cpp::{parse_file, parse_source, CppParser, Cursor, FrontendError, TranslationUnit};
pub use display::dump;
pub use node::{AccessSpecifier, CursorKind, Node, SourceLocation, SourceRange, Type, TypeKind};
pub use predicates::{BoxPredicate, PredicateError};
pub use walk::{descendants, walk, Walk};
