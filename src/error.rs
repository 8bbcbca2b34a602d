//! Error types for testresults

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for testresults operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for testresults
#[derive(Error, Debug)]
pub enum Error {
    /// No summary exists for the named suite.
    #[error("Suite not found: {0}")]
    SuiteNotFound(String),

    /// No execution record exists at the given directory.
    #[error("Execution not found at {0}")]
    ExecutionNotFound(PathBuf),

    /// The advisory lock guarding a suite summary could not be acquired in time.
    #[error("Timed out waiting for lock {0}")]
    LockTimeout(PathBuf),

    /// Configuration file error or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serializing or parsing a JSON document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base64 screenshot payload could not be decoded.
    #[error("Invalid screenshot encoding: {0}")]
    ScreenshotDecode(#[from] base64::DecodeError),

    /// Other error with custom message.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
