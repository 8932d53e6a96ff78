use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("failed to set C++ language for parser")]
    LanguageSet,

    #[error("failed to parse {path}")]
    ParseFailed { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
