//! Per-repository sync state machine.
//!
//! One [`RepositorySync`] owns one working copy and talks to the rest of the
//! pipeline exclusively through three channels: errors, results, and the
//! begin-sync signal. [`RepositorySync::sync`] never returns a value; a pass
//! either ends in a [`RepositoryGeneration`] on the results channel, or in
//! silence (with the reasons on the errors channel).

use crate::error::{SyncError, SyncFailure, SyncPhase};
use futures::{StreamExt, pin_mut};
use refdex_config::RepositoryConfig;
use refdex_extract::{ExtractorHandle, package_dirs};
use refdex_vcs::{LocalCopy, VcsHandle};
use refdex_view::{MAINLINE, PackageDoc, RepositoryGeneration, TaggedPackageSet};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::instrument;

/// Channel capacity for the per-repository event channels.
///
/// Small on purpose: these exist for hand-off, not buffering. A full channel
/// back-pressures the sync pass, which is harmless.
pub(crate) const CHANNEL_CAPACITY: usize = 16;

/// Identity and settings of one tracked repository.
///
/// Immutable after construction; one instance per configured repository,
/// owned by its sync worker for the whole process lifetime.
#[derive(Debug, Clone)]
pub struct TrackedRepository {
    /// Short project name; index key and route segment.
    pub project: String,
    /// Remote clone URL.
    pub remote: String,
    /// Local working copy location.
    pub cache_dir: PathBuf,
    /// Deadline applied to every VCS and extractor call.
    pub timeout: Duration,
    /// Branch checked out for the `mainline` pseudo-tag.
    pub mainline_ref: String,
}

impl From<&RepositoryConfig> for TrackedRepository {
    fn from(config: &RepositoryConfig) -> Self {
        Self {
            project: config.project.clone(),
            remote: config.remote.clone(),
            cache_dir: config.cache_dir.clone(),
            timeout: config.timeout(),
            mainline_ref: config.mainline.clone(),
        }
    }
}

impl TrackedRepository {
    /// Import path prefix derived from the remote location:
    /// `https://example.com/org/proj.git` becomes `example.com/org/proj`.
    fn import_prefix(&self) -> String {
        let remote = self.remote.trim_end_matches(".git");
        let remote = remote.split_once("://").map_or(remote, |(_, rest)| rest);
        // Also covers scp-like `git@host:org/proj` remotes.
        let remote = remote.split_once('@').map_or(remote, |(_, rest)| rest);
        remote.replace(':', "/").trim_end_matches('/').to_string()
    }

    /// The VCS reference behind a tag name; the `mainline` pseudo-tag maps
    /// to the configured branch, everything else is itself.
    fn reference_for<'a>(&'a self, tag: &'a str) -> &'a str {
        if tag == MAINLINE { &self.mainline_ref } else { tag }
    }
}

/// Receiving ends of one repository's event channels, taken once at
/// construction by whoever multiplexes them downstream.
pub struct SyncFeed {
    pub errors: mpsc::Receiver<SyncError>,
    pub results: mpsc::Receiver<RepositoryGeneration>,
    pub sync_started: mpsc::Receiver<()>,
}

/// Sync worker for one tracked repository.
pub struct RepositorySync {
    repo: TrackedRepository,
    vcs: VcsHandle,
    extractor: ExtractorHandle,
    /// At most one pass in flight per repository, even when a slow pass
    /// overruns into the next scheduler tick.
    pass_lock: Mutex<()>,
    errors: mpsc::Sender<SyncError>,
    results: mpsc::Sender<RepositoryGeneration>,
    sync_started: mpsc::Sender<()>,
}

impl RepositorySync {
    pub fn new(repo: TrackedRepository, vcs: VcsHandle, extractor: ExtractorHandle) -> (Self, SyncFeed) {
        let (errors_tx, errors_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (results_tx, results_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (started_tx, started_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let sync = Self {
            repo,
            vcs,
            extractor,
            pass_lock: Mutex::new(()),
            errors: errors_tx,
            results: results_tx,
            sync_started: started_tx,
        };
        let feed = SyncFeed { errors: errors_rx, results: results_rx, sync_started: started_rx };
        (sync, feed)
    }

    pub fn project(&self) -> &str {
        &self.repo.project
    }

    /// Run one sync pass.
    ///
    /// Serialised per repository by the pass lock. Emits the begin-sync
    /// signal once tags are known, then attempts every tag in listed order
    /// (discovered tags, then `mainline`), and finally emits a generation if
    /// at least one tag succeeded. Zero successful tags emit nothing at all:
    /// the previously published segment for this repository stays visible.
    #[instrument(skip(self), fields(project = %self.repo.project))]
    pub async fn sync(&self) {
        let _guard = self.pass_lock.lock().await;
        let deadline = self.repo.timeout;

        match self.vcs.ensure_local_copy(&self.repo.remote, &self.repo.cache_dir, deadline).await {
            Ok(LocalCopy::Created) => {
                tracing::info!(remote = %self.repo.remote, "cloned fresh working copy");
            },
            Ok(LocalCopy::Existing) => {
                // An existing copy may be sitting on an old tag from the
                // previous pass; move it back to mainline before pulling.
                let refreshed = async {
                    self.vcs.checkout(&self.repo.cache_dir, &self.repo.mainline_ref, deadline).await?;
                    self.vcs.pull(&self.repo.cache_dir, deadline).await
                };
                if let Err(e) = refreshed.await {
                    self.report(SyncPhase::WorkingCopy, SyncFailure::Vcs(e)).await;
                    return;
                }
            },
            Err(e) => {
                self.report(SyncPhase::WorkingCopy, SyncFailure::Vcs(e)).await;
                return;
            },
        }

        let mut tags = match self.vcs.list_tags(&self.repo.cache_dir, deadline).await {
            Ok(tags) => tags,
            Err(e) => {
                self.report(SyncPhase::TagList, SyncFailure::Vcs(e)).await;
                return;
            },
        };
        tags.push(MAINLINE.to_string());

        // Hand-off point: downstream now treats this repository's previous
        // generation as stale. A send failure means the pipeline is shutting
        // down, in which case the rest of the pass is pointless.
        if self.sync_started.send(()).await.is_err() {
            return;
        }

        let mut tag_sets = Vec::new();
        for tag in tags {
            let reference = self.repo.reference_for(&tag);
            if let Err(e) = self.vcs.checkout(&self.repo.cache_dir, reference, deadline).await {
                self.report(SyncPhase::Checkout(tag), SyncFailure::Vcs(e)).await;
                continue;
            }
            match self.collect_packages(&tag).await {
                Ok(set) => tag_sets.push(set),
                Err(e) => {
                    self.report(SyncPhase::Extract(tag), SyncFailure::Extract(e)).await;
                },
            }
        }

        if tag_sets.is_empty() {
            tracing::debug!("no tag produced packages; contributing no generation this pass");
            return;
        }
        let mut generation = RepositoryGeneration::new(tag_sets);
        generation.sort();
        let _ = self.results.send(generation).await;
    }

    /// Collect a [`TaggedPackageSet`] from the working copy as currently
    /// checked out. Any walk or extraction failure skips the whole tag.
    async fn collect_packages(&self, tag: &str) -> refdex_extract::error::Result<TaggedPackageSet> {
        let prefix = self.repo.import_prefix();
        let mut set = TaggedPackageSet::new(tag);
        let walk = package_dirs(&self.repo.cache_dir);
        pin_mut!(walk);
        while let Some(dir) = walk.next().await {
            let dir = dir?;
            let Some(payload) = self.extractor.extract_package(&dir, self.repo.timeout).await? else {
                continue;
            };
            let relative = dir.strip_prefix(&self.repo.cache_dir).unwrap_or(&dir);
            let relative = relative.to_string_lossy();
            let import_path = if relative.is_empty() {
                prefix.clone()
            } else {
                format!("{prefix}/{relative}")
            };
            set.packages.push(PackageDoc { import_path, payload });
        }
        Ok(set)
    }

    async fn report(&self, phase: SyncPhase, source: SyncFailure) {
        tracing::debug!(project = %self.repo.project, phase = %phase, "reporting sync error");
        let error = SyncError { project: self.repo.project.clone(), phase, source };
        let _ = self.errors.send(error).await;
    }
}
