//! Application error types.
//!
//! Every failure in the core is reported through [`Error`]; nothing here
//! terminates the process.

use std::path::PathBuf;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// A position did not address an existing item.
    #[error("Position {position} is out of range for {len} items")]
    IndexOutOfRange {
        /// Requested position.
        position: usize,
        /// Number of items at the time of the call.
        len: usize,
    },

    /// An insertion position was outside `0..=len`.
    #[error("Cannot insert at position {position} into {len} items")]
    InvalidPosition {
        /// Requested insertion position.
        position: usize,
        /// Number of items at the time of the call.
        len: usize,
    },

    /// A move did not fit inside the collection.
    #[error("Cannot move {count} items from {start} to {destination} within {len} items")]
    InvalidRange {
        /// First position of the run being moved.
        start: usize,
        /// Requested position of the run after the move.
        destination: usize,
        /// Length of the run.
        count: usize,
        /// Number of items at the time of the call.
        len: usize,
    },

    /// A save or load target does not exist.
    #[error("No service file at {0:?}")]
    NotFound(PathBuf),

    /// A service file could not be parsed or failed validation.
    #[error("Malformed service file {path:?}: {message}")]
    MalformedData {
        /// File that failed to load, if known.
        path: Option<PathBuf>,
        /// Description of the problem.
        message: String,
    },

    /// Data that would break a core invariant (e.g. two active items).
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<PathBuf>,
    },

    /// Service archive could not be written or read.
    #[error("Service archive error: {0}")]
    Archive(String),

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// Generic message error (escape hatch)
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Create a malformed-data error with file context
    pub fn malformed(message: impl Into<String>, path: impl Into<Option<PathBuf>>) -> Self {
        Self::MalformedData { path: path.into(), message: message.into() }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Whether the error came from a bad positional argument.
    pub const fn is_positional(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::InvalidPosition { .. } | Self::InvalidRange { .. }
        )
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { source: e, path: None }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedData { path: None, message: e.to_string() }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Msg(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Msg(s.to_string())
    }
}
