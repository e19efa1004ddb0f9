//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::Duration;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Underlying I/O error while reading the working copy.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// A directory expected to exist could not be walked.
    #[display("unreadable directory: {}", _0.display())]
    UnreadableDirectory(#[error(not(source))] PathBuf),
    /// Extraction exceeded the per-operation deadline.
    #[display("extraction exceeded its {}s deadline", _0.as_secs())]
    Timeout(#[error(not(source))] Duration),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
