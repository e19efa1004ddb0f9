//! Live index synchronization pipeline.
//!
//! The pipeline keeps a browsable documentation index continuously fresh:
//! a scheduler fires periodic sync passes, one worker per tracked repository
//! refreshes its working copy and extracts per-tag package documentation,
//! and an aggregator publishes a complete view once every repository has
//! reported. Failures are events on an error channel, never process faults.

mod aggregate;
pub mod error;
mod pipeline;
mod repo;
mod scheduler;

pub use crate::error::{SyncError, SyncFailure, SyncPhase};
pub use crate::pipeline::Pipeline;
pub use crate::repo::{RepositorySync, SyncFeed, TrackedRepository};
pub use crate::scheduler::SyncScheduler;
