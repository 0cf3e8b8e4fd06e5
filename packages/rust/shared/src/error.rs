//! Error types for DocIntel.
//!
//! Library crates use [`DocIntelError`] via `thiserror`.
//! App crates (cli) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all DocIntel operations.
#[derive(Debug, thiserror::Error)]
pub enum DocIntelError {
    /// Malformed or oversized input document, rejected before any stage runs.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A single extractor failed. Isolated — sibling extractors proceed.
    #[error("extraction error in stage '{stage}': {message}")]
    Extraction { stage: String, message: String },

    /// A stage references a dependency that is unknown, or that failed
    /// without the stage having a best-effort fallback.
    #[error("unresolved dependency: stage '{stage}' requires '{dependency}'")]
    UnresolvedDependency { stage: String, dependency: String },

    /// Run-level wall-clock budget exceeded.
    #[error("run timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// A report cannot be synthesized from the run (no scoring stage succeeded).
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Data validation error (bad stage graph, invalid weights, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocIntelError>;

impl DocIntelError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create an extraction error tagged with the failing stage.
    pub fn extraction(stage: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Extraction {
            stage: stage.into(),
            message: msg.into(),
        }
    }

    /// Create an unresolved-dependency error.
    pub fn unresolved(stage: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::UnresolvedDependency {
            stage: stage.into(),
            dependency: dependency.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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
}
