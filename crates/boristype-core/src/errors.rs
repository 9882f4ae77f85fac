use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("{file}:{span}: {message}")]
    Parse {
        file: String,
        message: String,
        span: Span,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Helper routine `{name}` is malformed: {message}")]
    HelperSource { name: &'static str, message: String },

    #[error("Skipped {file}: the batch was aborted after an earlier failure")]
    Aborted { file: String },
}

impl CompilationError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, CompilationError::Aborted { .. })
    }
}

pub type Result<T> = std::result::Result<T, CompilationError>;
