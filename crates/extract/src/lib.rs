//! Documentation extraction boundary.
//!
//! The pipeline hands this crate a checked-out directory and gets back an
//! opaque [`DocPayload`](models::DocPayload) per package, or `None` when a
//! directory holds nothing recognisable. Real parsing belongs behind the
//! [`DocExtractor`] trait; the built-in implementation only reads header
//! comments.

pub mod error;
mod header;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
mod walk;

pub use crate::header::HeaderCommentExtractor;
pub use crate::walk::package_dirs;

use crate::error::Result;
use crate::models::DocPayload;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// File extensions treated as source code by the built-in extractor.
const SOURCE_EXTENSIONS: &[&str] =
    &["rs", "go", "py", "rb", "sh", "js", "ts", "c", "h", "cc", "cpp", "hpp", "java"];

/// Whether a path looks like a source file to the built-in extractor.
pub fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Shared handle to a documentation extractor implementation.
pub type ExtractorHandle = Arc<dyn DocExtractor + Send + Sync>;

/// Extractor of structured documentation from a single package directory.
#[async_trait]
pub trait DocExtractor {
    /// Extract documentation for the package at `dir`.
    ///
    /// Returns `Ok(None)` (not an error) when the directory contains no
    /// recognisable source files. The call must complete within `deadline`;
    /// expiry is an ordinary error.
    async fn extract_package(&self, dir: &Path, deadline: Duration) -> Result<Option<DocPayload>>;
}
