//! Scripted VCS client for testing.
//!
//! One mock serves any number of working copies, the way a real client does.
//! Scripting is keyed by the working copy's base directory name, behaviour
//! can be changed mid-test (to simulate a remote going down between passes),
//! and every call is recorded so tests can assert on operation order. All
//! state lives behind a [`Mutex`](tokio::sync::Mutex), so the mock can be
//! shared across tasks the same way a real client would be.

use crate::error::{ErrorKind, Result};
use crate::{LocalCopy, VcsClient};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

fn scripted_failure(operation: &str) -> ErrorKind {
    ErrorKind::CommandFailed {
        command: format!("mock {operation}"),
        stderr: "scripted failure".to_string(),
    }
}

fn copy_name(path: &Path) -> String {
    path.file_name().and_then(|name| name.to_str()).unwrap_or_default().to_string()
}

#[derive(Debug, Default)]
struct MockState {
    /// Tag lists keyed by working copy base name.
    tags: HashMap<String, Vec<String>>,
    cloned: HashSet<String>,
    fail_working_copy: HashSet<String>,
    fail_tag_list: HashSet<String>,
    /// `(copy, reference)` pairs whose checkout fails.
    fail_checkout: HashSet<(String, String)>,
    calls: Vec<String>,
}

/// Fully scripted [`VcsClient`] for tests.
///
/// # Example
///
/// ```
/// use refdex_vcs::mock::MockVcs;
///
/// let vcs = MockVcs::default()
///     .tags_for("alpha", ["v1", "v2"])
///     .failing_checkout("alpha", "v2");
/// ```
#[derive(Debug, Default)]
pub struct MockVcs {
    state: Mutex<MockState>,
}

impl MockVcs {
    /// Script the tag list for one working copy.
    pub fn tags_for(mut self, copy: &str, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.state.get_mut().tags.insert(copy.to_string(), tags.into_iter().map(Into::into).collect());
        self
    }

    /// Make clone/pull of one working copy fail.
    pub fn failing_working_copy(mut self, copy: &str) -> Self {
        self.state.get_mut().fail_working_copy.insert(copy.to_string());
        self
    }

    /// Make tag enumeration of one working copy fail.
    pub fn failing_tag_list(mut self, copy: &str) -> Self {
        self.state.get_mut().fail_tag_list.insert(copy.to_string());
        self
    }

    /// Make checkout of one specific reference fail.
    pub fn failing_checkout(mut self, copy: &str, reference: &str) -> Self {
        self.state.get_mut().fail_checkout.insert((copy.to_string(), reference.to_string()));
        self
    }

    /// Start failing clone/pull for a working copy mid-test, as if the
    /// remote became unreachable between passes.
    pub async fn break_working_copy(&self, copy: &str) {
        self.state.lock().await.fail_working_copy.insert(copy.to_string());
    }

    /// Every operation performed so far, in call order, as
    /// `"<operation> <copy>"` strings.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl VcsClient for MockVcs {
    async fn ensure_local_copy(&self, _remote: &str, path: &Path, _deadline: Duration) -> Result<LocalCopy> {
        let copy = copy_name(path);
        let mut state = self.state.lock().await;
        state.calls.push(format!("ensure_local_copy {copy}"));
        if state.fail_working_copy.contains(&copy) {
            exn::bail!(scripted_failure("clone"));
        }
        if !state.cloned.insert(copy) {
            return Ok(LocalCopy::Existing);
        }
        Ok(LocalCopy::Created)
    }

    async fn pull(&self, path: &Path, _deadline: Duration) -> Result<()> {
        let copy = copy_name(path);
        let mut state = self.state.lock().await;
        state.calls.push(format!("pull {copy}"));
        if state.fail_working_copy.contains(&copy) {
            exn::bail!(scripted_failure("pull"));
        }
        Ok(())
    }

    async fn list_tags(&self, path: &Path, _deadline: Duration) -> Result<Vec<String>> {
        let copy = copy_name(path);
        let mut state = self.state.lock().await;
        state.calls.push(format!("list_tags {copy}"));
        if state.fail_tag_list.contains(&copy) {
            exn::bail!(scripted_failure("tag --list"));
        }
        Ok(state.tags.get(&copy).cloned().unwrap_or_default())
    }

    async fn checkout(&self, path: &Path, reference: &str, _deadline: Duration) -> Result<()> {
        let copy = copy_name(path);
        let mut state = self.state.lock().await;
        state.calls.push(format!("checkout {copy} {reference}"));
        if state.fail_checkout.contains(&(copy, reference.to_string())) {
            exn::bail!(scripted_failure(&format!("checkout {reference}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_first_ensure_creates_then_reports_existing() {
        let vcs = MockVcs::default();
        let path = Path::new("/tmp/alpha");
        assert_eq!(vcs.ensure_local_copy("remote", path, DEADLINE).await.unwrap(), LocalCopy::Created);
        assert_eq!(vcs.ensure_local_copy("remote", path, DEADLINE).await.unwrap(), LocalCopy::Existing);
        // A different working copy is tracked independently.
        let other = Path::new("/tmp/beta");
        assert_eq!(vcs.ensure_local_copy("remote", other, DEADLINE).await.unwrap(), LocalCopy::Created);
    }

    #[tokio::test]
    async fn test_tags_are_scripted_per_copy() {
        let vcs = MockVcs::default().tags_for("alpha", ["v1"]);
        assert_eq!(vcs.list_tags(Path::new("/tmp/alpha"), DEADLINE).await.unwrap(), vec!["v1"]);
        assert!(vcs.list_tags(Path::new("/tmp/beta"), DEADLINE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_checkout_failure_records_calls() {
        let vcs = MockVcs::default().failing_checkout("alpha", "v2");
        let path = Path::new("/tmp/alpha");
        assert!(vcs.checkout(path, "v1", DEADLINE).await.is_ok());
        assert!(vcs.checkout(path, "v2", DEADLINE).await.is_err());
        assert_eq!(vcs.calls().await, vec!["checkout alpha v1", "checkout alpha v2"]);
    }

    #[tokio::test]
    async fn test_working_copy_can_break_mid_test() {
        let vcs = MockVcs::default();
        let path = Path::new("/tmp/alpha");
        assert!(vcs.pull(path, DEADLINE).await.is_ok());
        vcs.break_working_copy("alpha").await;
        assert!(vcs.pull(path, DEADLINE).await.is_err());
    }
}
