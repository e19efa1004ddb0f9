//! Sync error events.
//!
//! Unlike the other crates, errors here are *events*, not early returns: a
//! repository pass reports what went wrong on its error channel and carries
//! on (or gives up on that pass). Nothing in this module is ever fatal to
//! the process.

use derive_more::Display;

/// Phase of a sync pass in which an error occurred.
///
/// A timeout is indistinguishable from any other failure of the phase it
/// occurred in; the taxonomy is about what the pass does next, not about the
/// root cause.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    /// Clone or pull of the working copy failed. Aborts the whole pass.
    #[display("working-copy refresh")]
    WorkingCopy,
    /// Tag enumeration failed. Aborts the whole pass.
    #[display("tag enumeration")]
    TagList,
    /// Checkout of one tag failed. Skips that tag only.
    #[display("checkout of `{_0}`")]
    Checkout(String),
    /// Documentation extraction at one tag failed. Skips that tag only.
    #[display("extraction at `{_0}`")]
    Extract(String),
}

/// The failure underlying a [`SyncError`], by boundary.
#[derive(Debug, Display)]
pub enum SyncFailure {
    #[display("{_0}")]
    Vcs(refdex_vcs::error::Error),
    #[display("{_0}")]
    Extract(refdex_extract::error::Error),
}

/// A non-fatal error reported by one repository's sync pass.
#[derive(Debug, Display)]
#[display("sync of `{project}` failed during {phase}: {source}")]
pub struct SyncError {
    /// Project whose pass reported the error.
    pub project: String,
    pub phase: SyncPhase,
    pub source: SyncFailure,
}
