use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredicateError {
    #[error("invalid name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
