//! Multi-repository sync scheduler.
//!
//! Fires an immediate pass at startup, then one per refresh interval,
//! forever. Every pass fans all repositories out in parallel and joins them
//! before the pass counts as complete; a slow repository delays the *next*
//! pass, never its siblings' reporting in the current one.

use crate::repo::RepositorySync;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

pub struct SyncScheduler {
    repositories: Vec<Arc<RepositorySync>>,
    refresh: Duration,
}

impl SyncScheduler {
    pub fn new(repositories: Vec<Arc<RepositorySync>>, refresh: Duration) -> Self {
        Self { repositories, refresh }
    }

    /// Run until the shutdown signal flips.
    ///
    /// Shutdown stops *scheduling*; a pass already in flight runs to
    /// completion, bounded by each repository's own per-operation timeouts.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.refresh);
        // A pass that overruns its interval should not be followed by a
        // burst of catch-up passes.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                // The first tick fires immediately: the startup pass.
                _ = ticker.tick() => self.pass().await,
                _ = shutdown.changed() => {
                    tracing::debug!("scheduler received shutdown, no further passes");
                    return;
                },
            }
        }
    }

    /// One full fan-out: every repository syncs concurrently, and the pass
    /// ends when the last of them finishes.
    async fn pass(&self) {
        tracing::info!(repositories = self.repositories.len(), "beginning sync pass");
        let mut tasks = JoinSet::new();
        for repo in &self.repositories {
            let repo = Arc::clone(repo);
            tasks.spawn(async move { repo.sync().await });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "sync task panicked");
            }
        }
        tracing::info!("sync pass complete");
    }
}
