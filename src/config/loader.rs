use crate::config::schema::{QueryConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read query file {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse query TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse query TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid query ({}): {}", path.display(), source),
                None => write!(f, "invalid query: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<QueryConfig, ConfigError> {
    let config: QueryConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    tracing::debug!(name = %config.meta.name, "loaded query");
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<QueryConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "reading query file");
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Category, QueryExpr, Step};

    #[test]
    fn loads_a_nested_query() {
        let config = load_from_str(
            r#"
            [meta]
            name = "public-f"

            [parse]
            skip_function_bodies = true

            [query]
            all = [
              { is = "class_definition" },
              { any_predecessor = { step = "lexical_parent", matches = { name = "ns" } } },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.meta.name, "public-f");
        assert!(config.parse.skip_function_bodies);
        assert!(!config.parse.detailed_preprocessing_record);
        let QueryExpr::All(items) = &config.query else {
            panic!("expected all, got {:?}", config.query);
        };
        assert_eq!(items[0], QueryExpr::Is(Category::ClassDefinition));
        let QueryExpr::AnyPredecessor(ancestry) = &items[1] else {
            panic!("expected any_predecessor, got {:?}", items[1]);
        };
        assert_eq!(ancestry.step, Step::LexicalParent);
        assert_eq!(*ancestry.matches, QueryExpr::Name("ns".into()));
    }

    #[test]
    fn step_defaults_to_semantic_parent() {
        let config = load_from_str(
            r#"
            [query]
            all_predecessors = { matches = { is = "namespace" } }
            "#,
        )
        .unwrap();
        let QueryExpr::AllPredecessors(ancestry) = config.query else {
            panic!("expected all_predecessors");
        };
        assert_eq!(ancestry.step, Step::SemanticParent);
    }

    #[test]
    fn rejects_unknown_operators() {
        let err = load_from_str("[query]\nsome_child = { is = \"class\" }\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn missing_query_is_a_parse_error() {
        let err = load_from_str("[meta]\nname = \"empty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn reports_validation_failures() {
        let err = load_from_str("[query]\nname = \"(\"\n").unwrap_err();
        let ConfigError::Validation { source, .. } = &err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(source.issues.len(), 1);
        assert!(err.to_string().starts_with("invalid query: "));
    }

    #[test]
    fn path_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[query]\ntypename = \"\"\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { path: Some(_), .. }));
        assert!(err.to_string().contains("bad.toml"));

        let missing = load_from_path(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
