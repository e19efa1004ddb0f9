//! Atomic view publication.
//!
//! One [`Publisher`] owns the write side of the served-view slot; any number
//! of [`ViewHandle`]s read from it. A publish replaces the `Arc<View>` in the
//! slot; a request that already captured the previous `Arc` keeps a fully
//! self-consistent view until it drops it, at which point the old view is
//! plain garbage.

use crate::generation::IndexGeneration;
use crate::view::View;
use std::sync::{Arc, PoisonError, RwLock};

type Slot = Arc<RwLock<Arc<View>>>;

/// Write side of the served-view slot.
#[derive(Debug)]
pub struct Publisher {
    slot: Slot,
}

/// Read side of the served-view slot, cloneable into every request handler.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    slot: Slot,
}

impl Publisher {
    /// Create a publisher and its paired read handle.
    ///
    /// The initial view is the refreshing placeholder: nothing may be served
    /// before the first complete generation.
    pub fn new() -> (Self, ViewHandle) {
        let slot: Slot = Arc::new(RwLock::new(Arc::new(View::Refreshing)));
        (Self { slot: Arc::clone(&slot) }, ViewHandle { slot })
    }

    /// Build a view from a complete generation and swap it into the slot.
    pub fn publish(&self, generation: IndexGeneration) {
        let view = Arc::new(View::build(generation));
        tracing::info!(routes = view.route_count(), "publishing new index view");
        self.swap(view);
    }

    /// Swap in the refreshing placeholder.
    ///
    /// Used whenever a repository has begun a new pass before producing its
    /// next generation, and before the first-ever generation completes.
    pub fn publish_refreshing(&self) {
        tracing::debug!("publishing refreshing placeholder");
        self.swap(Arc::new(View::Refreshing));
    }

    fn swap(&self, view: Arc<View>) {
        // A panic while holding this lock can only come from the swap itself,
        // which is a plain pointer store; recover the guard rather than
        // poisoning every future request.
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = view;
    }
}

impl ViewHandle {
    /// Capture the currently-served view.
    ///
    /// The returned `Arc` stays valid and self-consistent regardless of any
    /// publishes that happen afterwards.
    pub fn current(&self) -> Arc<View> {
        Arc::clone(&self.slot.read().unwrap_or_else(PoisonError::into_inner))
    }
}
