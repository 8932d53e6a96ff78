use crate::cpp::errors::FrontendError;
use crate::cpp::lower::lower;
use crate::cpp::unit::TranslationUnit;
use ast_grep_language::{LanguageExt, SupportLang};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tree_sitter::Parser;

/// Knobs controlling which cursors the lowering produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Emit `MacroDefinition` and `InclusionDirective` cursors.
    pub detailed_preprocessing_record: bool,
    /// Do not emit `CompoundStmt` cursors for function bodies.
    pub skip_function_bodies: bool,
}

/// Tree-sitter parser wrapper for C++ source code.
pub struct CppParser {
    parser: Parser,
    options: ParseOptions,
}

impl CppParser {
    /// Create a new C++ parser with default options.
    pub fn new() -> Result<Self, FrontendError> {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Result<Self, FrontendError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = SupportLang::Cpp.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| FrontendError::LanguageSet)?;

        Ok(Self { parser, options })
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Parse `source`, attributing every location to `path`.
    pub fn parse(&mut self, path: &Path, source: &str) -> Result<TranslationUnit, FrontendError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FrontendError::ParseFailed {
                path: path.to_path_buf(),
            })?;
        Ok(lower(path, source, &tree, self.options))
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<TranslationUnit, FrontendError> {
        let source = fs::read_to_string(path).map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(path, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CursorKind, Node};

    #[test]
    fn parse_valid_cpp() {
        let mut parser = CppParser::new().unwrap();
        let unit = parser.parse(Path::new("tmp.cpp"), "class Foo {};").unwrap();

        assert!(unit.diagnostics().is_empty());
        assert_eq!(unit.cursor().kind(), CursorKind::TranslationUnit);
        assert_eq!(unit.cursor().spelling(), "tmp.cpp");
    }

    #[test]
    fn parse_invalid_cpp_keeps_going() {
        let mut parser = CppParser::new().unwrap();
        let unit = parser
            .parse(Path::new("tmp.cpp"), "class Foo { int x; }; void (;")
            .unwrap();

        assert!(!unit.diagnostics().is_empty());
        assert!(unit
            .cursor()
            .children()
            .any(|c| c.kind() == CursorKind::ClassDecl));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let mut parser = CppParser::new().unwrap();
        let err = parser
            .parse_file(Path::new("/nonexistent/dir/tmp.cpp"))
            .unwrap_err();
        assert!(matches!(err, FrontendError::Io { .. }));
    }

    #[test]
    fn options_are_kept() {
        let options = ParseOptions {
            detailed_preprocessing_record: true,
            skip_function_bodies: false,
        };
        let parser = CppParser::with_options(options).unwrap();
        assert_eq!(parser.options(), options);
    }
}
