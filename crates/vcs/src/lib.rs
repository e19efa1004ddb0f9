//! Version control client boundary.
//!
//! The sync pipeline never talks to git directly; it goes through the
//! [`VcsClient`] trait so tests can substitute a fully scripted
//! [`MockVcs`](mock::MockVcs). The only real implementation shells out to the
//! `git` binary with every call bounded by the caller's deadline.

pub mod error;
mod git;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use crate::git::GitClient;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a VCS client implementation.
pub type VcsHandle = Arc<dyn VcsClient + Send + Sync>;

/// Outcome of [`VcsClient::ensure_local_copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCopy {
    /// The working copy did not exist and was freshly cloned.
    Created,
    /// A working copy was already present on disk.
    Existing,
}

/// Client for a version control system.
///
/// All operations accept a deadline and must fail fast on expiry; an expired
/// deadline is an ordinary error, never a panic or a hang.
#[async_trait]
pub trait VcsClient {
    /// Make sure a working copy of `remote` exists at `path`, cloning it if
    /// necessary. Reports whether the copy already existed so the caller can
    /// decide whether a pull is needed.
    async fn ensure_local_copy(&self, remote: &str, path: &Path, deadline: Duration) -> Result<LocalCopy>;

    /// Fast-forward the currently checked out branch at `path`.
    async fn pull(&self, path: &Path, deadline: Duration) -> Result<()>;

    /// List all tags known to the working copy at `path`.
    async fn list_tags(&self, path: &Path, deadline: Duration) -> Result<Vec<String>>;

    /// Check out `reference` (a tag or branch name) in the working copy.
    async fn checkout(&self, path: &Path, reference: &str, deadline: Duration) -> Result<()>;
}
