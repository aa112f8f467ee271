//! Error types for Boardsmith.
//!
//! Library crates use [`BoardsmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Boardsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardsmithError {
    /// The board reference does not contain a parseable identifier.
    #[error("reference error: {message}")]
    Reference { message: String },

    /// The board source could not return items (auth, network, not-found).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// No recovery strategy produced a structured document from model text.
    #[error("extraction error: could not extract a JSON document from model output: {prefix}...")]
    Extraction { prefix: String },

    /// The model backend call itself failed.
    #[error("model call error: {0}")]
    ModelCall(String),

    /// An extracted document does not match its schema, or a stage is
    /// missing a required artifact.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BoardsmithError>;

/// Copyable tag identifying which branch of the taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Reference,
    Fetch,
    Extraction,
    ModelCall,
    Validation,
    Config,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Reference => "reference",
            Self::Fetch => "fetch",
            Self::Extraction => "extraction",
            Self::ModelCall => "model_call",
            Self::Validation => "validation",
            Self::Config => "config",
            Self::Io => "io",
        };
        f.write_str(s)
    }
}

/// Maximum number of characters of model output kept in an extraction error.
pub const EXTRACTION_PREFIX_CHARS: usize = 100;

impl BoardsmithError {
    /// Create a reference error from any displayable message.
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference {
            message: msg.into(),
        }
    }

    /// Create an extraction error, keeping only a bounded prefix of `text`.
    pub fn extraction(text: &str) -> Self {
        Self::Extraction {
            prefix: text.chars().take(EXTRACTION_PREFIX_CHARS).collect(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The taxonomy branch of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Reference { .. } => ErrorKind::Reference,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::ModelCall(_) => ErrorKind::ModelCall,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}
