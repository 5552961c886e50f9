//! Error types for apidrift

use std::process::ExitCode;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ApiDriftError>;

/// Errors that can occur during analysis
///
/// Per-file problems (unreadable file, parse failure on one file) are
/// handled at the call site by logging and skipping; the variants here
/// surface only when an operation cannot produce a result at all.
#[derive(Debug, Error)]
pub enum ApiDriftError {
    /// Input file or directory does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// File extension has no registered analyzer
    #[error("Unsupported language extension: {extension}")]
    UnsupportedLanguage { extension: String },

    /// Source could not be parsed
    #[error("Parse failure: {message}")]
    ParseFailure { message: String },

    /// Project configuration file was present but malformed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying I/O error (e.g. acquiring the root directory listing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiDriftError {
    /// Map the error to a process exit code
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(2),
            Self::UnsupportedLanguage { .. } => ExitCode::from(3),
            Self::ParseFailure { .. } => ExitCode::from(4),
            Self::ConfigError { .. } => ExitCode::from(5),
            Self::Serialization(_) | Self::Io(_) => ExitCode::FAILURE,
        }
    }
}
