//! Thread-local parser pooling.
//!
//! Creates one [`CppParser`] per thread on first use and reuses it for every
//! later parse on that thread.

use crate::cpp::{CppParser, FrontendError};
use std::cell::RefCell;

thread_local! {
    static CPP_PARSER: RefCell<Option<Box<CppParser>>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// The pooled parser uses default [`ParseOptions`](crate::cpp::ParseOptions);
/// build a [`CppParser`] directly for anything else. `f` may call back into
/// the pool; the nested call gets a parser of its own.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use glud::pool::with_parser;
/// use std::path::Path;
///
/// let unit = with_parser(|parser| parser.parse(Path::new("tmp.cpp"), "void f();"))??;
/// assert_eq!(unit.len(), 2);
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, FrontendError>
where
    F: FnOnce(&mut CppParser) -> R,
{
    let pooled = CPP_PARSER.with(|cell| cell.borrow_mut().take());
    let mut parser = match pooled {
        Some(parser) => parser,
        None => Box::new(CppParser::new()?),
    };
    // the slot stays empty while `f` runs, so nested calls build their own parser
    let result = f(&mut *parser);
    CPP_PARSER.with(|cell| {
        cell.borrow_mut().get_or_insert(parser);
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parser_is_reused_within_a_thread() {
        let first = with_parser(|parser| parser as *const CppParser as usize).unwrap();
        let second = with_parser(|parser| parser as *const CppParser as usize).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nested_use_gets_a_separate_parser() {
        let (outer, inner) = with_parser(|parser| {
            let outer = parser.parse(Path::new("a.cpp"), "int x;").unwrap();
            let inner = crate::cpp::parse_source("b.cpp", "int y; int z;").unwrap();
            (outer, inner)
        })
        .unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(inner.len(), 3);

        // the outer parser is still pooled afterwards
        let again = with_parser(|parser| parser.parse(Path::new("c.cpp"), "int w;"))
            .unwrap()
            .unwrap();
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn pooled_parser_parses() {
        let unit = with_parser(|parser| parser.parse(Path::new("a.cpp"), "int x;"))
            .unwrap()
            .unwrap();
        assert_eq!(unit.len(), 2);
    }
}
