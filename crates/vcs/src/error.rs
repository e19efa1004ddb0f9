//! VCS Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::time::Duration;

/// A VCS error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for VCS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No usable VCS binary could be located on the PATH.
    #[display("no usable `git` binary found on PATH")]
    BinaryNotFound,
    /// The subprocess ran but exited with a non-zero status.
    #[display("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line that was executed.
        command: String,
        /// Trimmed stderr output from the subprocess.
        stderr: String,
    },
    /// The operation exceeded its configured deadline.
    ///
    /// Callers treat this exactly like any other failure of the same
    /// operation; it exists as its own kind only for log readability.
    #[display("operation exceeded its {}s deadline", _0.as_secs())]
    Timeout(#[error(not(source))] Duration),
    /// Underlying I/O error (spawn failure, unreadable working copy, ...).
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The subprocess produced output that was not valid UTF-8.
    #[display("command produced non-UTF-8 output")]
    InvalidOutput,
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Timeouts and command failures are usually transient network or
        // remote conditions; the next scheduled pass may succeed.
        matches!(self, Self::Timeout(_) | Self::CommandFailed { .. } | Self::Io(_))
    }
}
