//! C++ tree model backed by tree-sitter.
//!
//! Source text is parsed with the tree-sitter C++ grammar and lowered into an
//! immutable cursor tree shaped after libclang: declarations only, with
//! access levels, qualified type spellings and semantic parents resolved.
//! [`Cursor`] implements [`Node`](crate::node::Node), so every predicate and
//! the walker work on it directly.

pub mod errors;
mod lower;
pub mod parser;
pub mod unit;

pub use errors::FrontendError;
pub use parser::{CppParser, ParseOptions};
pub use unit::{Children, Cursor, Diagnostic, TranslationUnit};

use crate::pool::with_parser;
use std::path::Path;

/// Parse `source` as if read from `path`, using this thread's pooled parser.
pub fn parse_source(
    path: impl AsRef<Path>,
    source: &str,
) -> Result<TranslationUnit, FrontendError> {
    with_parser(|parser| parser.parse(path.as_ref(), source))?
}

/// Read and parse a file, using this thread's pooled parser.
pub fn parse_file(path: impl AsRef<Path>) -> Result<TranslationUnit, FrontendError> {
    with_parser(|parser| parser.parse_file(path.as_ref()))?
}
