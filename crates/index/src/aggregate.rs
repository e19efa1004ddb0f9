//! Result aggregation and the error sink.
//!
//! Every repository reports on its own three channels; forwarder tasks
//! multiplex those onto two shared channels (events and errors), and a
//! single aggregator loop turns complete sets of repository generations into
//! published views. Publication happens exactly once per pass: only when the
//! accumulator holds an entry for every tracked repository.

use crate::error::SyncError;
use crate::repo::SyncFeed;
use refdex_view::{IndexGeneration, ProjectGeneration, Publisher, RepositoryGeneration};
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};

/// Multiplexed event from one repository's sync worker.
#[derive(Debug)]
pub(crate) enum SyncEvent {
    /// The repository began a fresh pass; its previous generation is stale.
    Started { project: String },
    /// The repository completed a pass with at least one tagged set.
    Generation { project: String, generation: RepositoryGeneration },
}

/// Forward one repository's feed onto the shared event and error channels,
/// labelling everything with the project name, until shutdown or until the
/// feed closes.
pub(crate) async fn forward(
    project: String,
    mut feed: SyncFeed,
    events: mpsc::Sender<SyncEvent>,
    errors: mpsc::Sender<SyncError>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            started = feed.sync_started.recv() => {
                if started.is_none() {
                    return;
                }
                let event = SyncEvent::Started { project: project.clone() };
                if events.send(event).await.is_err() {
                    return;
                }
            },
            generation = feed.results.recv() => {
                let Some(generation) = generation else { return };
                let event = SyncEvent::Generation { project: project.clone(), generation };
                if events.send(event).await.is_err() {
                    return;
                }
            },
            error = feed.errors.recv() => {
                let Some(error) = error else { return };
                if errors.send(error).await.is_err() {
                    return;
                }
            },
        }
    }
}

/// Consume sync errors and log them. Never stops the pipeline.
pub(crate) async fn error_sink(mut errors: mpsc::Receiver<SyncError>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            error = errors.recv() => {
                let Some(error) = error else { return };
                tracing::warn!(
                    project = %error.project,
                    phase = %error.phase,
                    error = %error.source,
                    "repository sync error",
                );
            },
        }
    }
}

/// Accumulates repository generations into complete index generations.
pub struct ResultAggregator {
    publisher: Publisher,
    /// Number of tracked repositories; the accumulator is complete when it
    /// holds this many entries.
    tracked: usize,
}

impl ResultAggregator {
    pub fn new(publisher: Publisher, tracked: usize) -> Self {
        Self { publisher, tracked }
    }

    /// Consume multiplexed sync events until shutdown.
    ///
    /// A begin-sync event degrades the served view to the refreshing
    /// placeholder immediately; accumulated work-in-progress is kept (the
    /// published view is what changes, not the accumulator).
    pub async fn run(mut self, mut events: mpsc::Receiver<SyncEvent>, mut shutdown: watch::Receiver<bool>) {
        let mut accumulator: HashMap<String, RepositoryGeneration> = HashMap::new();
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                event = events.recv() => {
                    let Some(event) = event else { return };
                    self.consume(event, &mut accumulator);
                },
            }
        }
    }

    fn consume(&mut self, event: SyncEvent, accumulator: &mut HashMap<String, RepositoryGeneration>) {
        match event {
            SyncEvent::Started { project } => {
                tracing::debug!(%project, "repository began a fresh pass");
                self.publisher.publish_refreshing();
            },
            SyncEvent::Generation { project, generation } => {
                // Record/overwrite: within one generation a repository
                // contributes at most one entry.
                accumulator.insert(project, generation);
                if accumulator.len() < self.tracked {
                    tracing::debug!(
                        reported = accumulator.len(),
                        tracked = self.tracked,
                        "generation incomplete, waiting for remaining repositories",
                    );
                    return;
                }
                let projects = accumulator
                    .drain()
                    .map(|(project, generation)| ProjectGeneration { project, generation })
                    .collect();
                let mut index = IndexGeneration::new(projects);
                index.sort();
                self.publisher.publish(index);
            },
        }
    }
}
