//! Pipeline assembly and lifecycle.
//!
//! [`Pipeline::start`] wires every long-lived task together: one sync worker
//! and one forwarder per repository, the aggregator, the error sink and the
//! scheduler, all listening on a single shutdown signal. [`Pipeline::shutdown`]
//! flips that signal and joins every task.

use crate::aggregate::{ResultAggregator, error_sink, forward};
use crate::repo::{CHANNEL_CAPACITY, RepositorySync, TrackedRepository};
use crate::scheduler::SyncScheduler;
use refdex_extract::ExtractorHandle;
use refdex_vcs::VcsHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

/// Running sync pipeline. Dropping it aborts all tasks; prefer
/// [`Pipeline::shutdown`] for an orderly stop.
pub struct Pipeline {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

impl Pipeline {
    /// Spawn the whole pipeline and return it together with the read handle
    /// for the served view.
    ///
    /// The scheduler fires its startup pass immediately; until the first
    /// complete generation, the handle serves the refreshing placeholder.
    pub fn start(
        repositories: Vec<TrackedRepository>,
        refresh: Duration,
        vcs: VcsHandle,
        extractor: ExtractorHandle,
    ) -> (Self, refdex_view::ViewHandle) {
        let (publisher, handle) = refdex_view::Publisher::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut tasks = JoinSet::new();
        let mut workers = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let project = repository.project.clone();
            let (sync, feed) =
                RepositorySync::new(repository, Arc::clone(&vcs), Arc::clone(&extractor));
            workers.push(Arc::new(sync));
            tasks.spawn(forward(
                project,
                feed,
                event_tx.clone(),
                error_tx.clone(),
                shutdown_rx.clone(),
            ));
        }
        // Forwarders hold the only remaining senders; when they exit, the
        // aggregator and sink drain out naturally.
        drop(event_tx);
        drop(error_tx);

        let aggregator = ResultAggregator::new(publisher, workers.len());
        tasks.spawn(aggregator.run(event_rx, shutdown_rx.clone()));
        tasks.spawn(error_sink(error_rx, shutdown_rx.clone()));
        tasks.spawn(SyncScheduler::new(workers, refresh).run(shutdown_rx));

        tracing::info!("sync pipeline started");
        (Self { shutdown: shutdown_tx, tasks }, handle)
    }

    /// Signal shutdown and wait for every pipeline task to finish.
    pub async fn shutdown(mut self) {
        tracing::info!("shutting down sync pipeline");
        let _ = self.shutdown.send(true);
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "pipeline task panicked");
            }
        }
        tracing::info!("sync pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdex_extract::mock::MockExtractor;
    use refdex_vcs::mock::MockVcs;
    use refdex_view::{MAINLINE, View, ViewHandle};

    fn tracked(temp_dir: &tempfile::TempDir, name: &str, packages: &[&str]) -> TrackedRepository {
        let cache_dir = temp_dir.path().join(name);
        for package in packages {
            std::fs::create_dir_all(cache_dir.join(package)).unwrap();
        }
        std::fs::create_dir_all(&cache_dir).unwrap();
        TrackedRepository {
            project: name.to_string(),
            remote: format!("https://example.com/org/{name}.git"),
            cache_dir,
            timeout: Duration::from_secs(5),
            mainline_ref: "master".to_string(),
        }
    }

    /// Poll the handle until it serves a ready view.
    async fn wait_for_ready(handle: &ViewHandle) -> std::sync::Arc<View> {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let view = handle.current();
                if !view.is_refreshing() {
                    return view;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no view published within the deadline")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_startup_pass_publishes_complete_view() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repositories = vec![
            tracked(&temp_dir, "alpha", &["server", "client"]),
            tracked(&temp_dir, "beta", &[]),
        ];
        let vcs = Arc::new(MockVcs::default().tags_for("alpha", ["v1"]));
        let extractor = Arc::new(MockExtractor::with_packages(["server", "client"]));
        let (pipeline, handle) =
            Pipeline::start(repositories, Duration::from_secs(3600), vcs, extractor);

        let view = wait_for_ready(&handle).await;
        let repos = view.repositories().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "alpha");
        let alpha_tags: Vec<_> = repos[0].tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(alpha_tags, vec![MAINLINE, "v1"]);
        assert_eq!(repos[0].tags[0].packages.len(), 2);
        // Beta has no version tags, so only the mainline pseudo-tag.
        assert_eq!(repos[1].name, "beta");
        let beta_tags: Vec<_> = repos[1].tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(beta_tags, vec![MAINLINE]);

        pipeline.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_routes_resolve_against_published_view() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repositories = vec![tracked(&temp_dir, "alpha", &["server"])];
        let vcs = Arc::new(MockVcs::default());
        let extractor = Arc::new(MockExtractor::with_packages(["server"]));
        let (pipeline, handle) =
            Pipeline::start(repositories, Duration::from_secs(3600), vcs, extractor);

        let view = wait_for_ready(&handle).await;
        assert!(matches!(view.resolve("/repo/alpha"), refdex_view::Resolution::Page(_)));
        assert!(matches!(
            view.resolve("/repo/alpha/tag/mainline/pkg/example.com/org/alpha/server"),
            refdex_view::Resolution::Page(refdex_view::Page::Package(_))
        ));
        assert!(matches!(view.resolve("/repo/missing"), refdex_view::Resolution::NotFound));

        pipeline.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_drains_promptly() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repositories = vec![tracked(&temp_dir, "alpha", &[])];
        let (pipeline, handle) = Pipeline::start(
            repositories,
            Duration::from_secs(3600),
            Arc::new(MockVcs::default()),
            Arc::new(MockExtractor::default()),
        );
        wait_for_ready(&handle).await;

        tokio::time::timeout(Duration::from_secs(5), pipeline.shutdown())
            .await
            .expect("shutdown did not drain in time");
        // The handle keeps serving the last published view after shutdown.
        assert!(!handle.current().is_refreshing());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failing_repository_never_publishes() {
        // Alpha's clone fails every pass: the generation can never complete,
        // so nothing but the refreshing placeholder is ever served.
        let temp_dir = tempfile::tempdir().unwrap();
        let repositories = vec![
            tracked(&temp_dir, "alpha", &[]),
            tracked(&temp_dir, "beta", &[]),
        ];
        let vcs = Arc::new(MockVcs::default().failing_working_copy("alpha"));
        let (pipeline, handle) = Pipeline::start(
            repositories,
            Duration::from_secs(3600),
            vcs,
            Arc::new(MockExtractor::default()),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(handle.current().is_refreshing());

        pipeline.shutdown().await;
    }
}
