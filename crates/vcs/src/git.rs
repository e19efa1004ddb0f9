//! Git subprocess client.
//!
//! Shells out to the system `git` binary via [`tokio::process`]. Every
//! invocation is wrapped in [`tokio::time::timeout`] with `kill_on_drop` set,
//! so an expired deadline reliably reaps the child instead of leaking it.

use crate::error::{ErrorKind, Result};
use crate::{LocalCopy, VcsClient};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::instrument;

/// VCS client backed by the system `git` binary.
#[derive(Debug, Clone)]
pub struct GitClient {
    binary: PathBuf,
}

impl GitClient {
    /// Locate `git` on the PATH and build a client around it.
    pub fn from_path() -> Result<Self> {
        let binary = which::which("git").or_raise(|| ErrorKind::BinaryNotFound)?;
        tracing::debug!(binary = %binary.display(), "located git binary");
        Ok(Self { binary })
    }

    /// Build a client around an explicit git binary location.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    /// Run `git <args>` with `cwd` as working directory, bounded by `deadline`.
    ///
    /// Returns trimmed stdout on success. A non-zero exit status becomes
    /// [`ErrorKind::CommandFailed`] carrying the command line and stderr.
    async fn run(&self, cwd: Option<&Path>, args: &[&str], deadline: Duration) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        // If the timeout fires, the output future is dropped and the child
        // is reaped rather than left running against the working copy.
        command.kill_on_drop(true);

        let command_line = format!("git {}", args.join(" "));
        tracing::trace!(command = %command_line, cwd = ?cwd, "running git");
        let output = tokio::time::timeout(deadline, command.output())
            .await
            .map_err(|_| ErrorKind::Timeout(deadline))?
            .map_err(ErrorKind::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            exn::bail!(ErrorKind::CommandFailed { command: command_line, stderr });
        }
        let stdout = String::from_utf8(output.stdout).or_raise(|| ErrorKind::InvalidOutput)?;
        Ok(stdout.trim().to_string())
    }
}

#[async_trait]
impl VcsClient for GitClient {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn ensure_local_copy(&self, remote: &str, path: &Path, deadline: Duration) -> Result<LocalCopy> {
        if path.join(".git").is_dir() {
            return Ok(LocalCopy::Existing);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        let path_arg = path.to_str().ok_or_else(|| ErrorKind::Io(invalid_path(path)))?;
        self.run(None, &["clone", remote, path_arg], deadline).await?;
        Ok(LocalCopy::Created)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn pull(&self, path: &Path, deadline: Duration) -> Result<()> {
        self.run(Some(path), &["pull", "--ff-only"], deadline).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn list_tags(&self, path: &Path, deadline: Duration) -> Result<Vec<String>> {
        let stdout = self.run(Some(path), &["tag", "--list"], deadline).await?;
        Ok(stdout.lines().map(str::trim).filter(|line| !line.is_empty()).map(String::from).collect())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn checkout(&self, path: &Path, reference: &str, deadline: Duration) -> Result<()> {
        self.run(Some(path), &["checkout", "--force", reference], deadline).await?;
        Ok(())
    }
}

fn invalid_path(path: &Path) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("non-UTF-8 path: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The git binary itself is out of scope for unit tests (integration
    // behaviour is covered by the pipeline tests against MockVcs); these
    // only pin down the subprocess plumbing.

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let client = GitClient::new("/nonexistent/refdex-test-git");
        let err = client.pull(Path::new("/tmp"), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_timeout() {
        // `sleep` stands in for a git invocation that hangs on the network.
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let client = GitClient::new(sleep);
        let err = client.run(None, &["30"], Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Timeout(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let Ok(sh) = which::which("false") else {
            return;
        };
        let client = GitClient::new(sh);
        let err = client.checkout(Path::new("/tmp"), "v1", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_existing_working_copy_detected() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        // Binary is never invoked when the working copy already exists.
        let client = GitClient::new("/nonexistent/refdex-test-git");
        let copy = client
            .ensure_local_copy("https://example.com/r.git", temp_dir.path(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(copy, LocalCopy::Existing);
    }
}
