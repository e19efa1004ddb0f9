//! Generation data model, view construction and the atomic publish path.
//!
//! Data flows in one direction: a complete [`IndexGeneration`] arrives from
//! the aggregator, [`Publisher::publish`] materializes it into an immutable
//! [`View`] and swaps the served slot. Readers never take locks beyond the
//! instant of capturing the current `Arc<View>`.

mod generation;
mod publish;
mod view;

pub use crate::generation::{
    IndexGeneration, MAINLINE, PackageDoc, ProjectGeneration, RepositoryGeneration, TaggedPackageSet,
};
pub use crate::publish::{Publisher, ViewHandle};
pub use crate::view::{
    HOME_ROUTE, IndexView, Page, PackagePage, REPOSITORIES_ROUTE, RepositoryPage, Resolution, TagPage,
    View,
};
