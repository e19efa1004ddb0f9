//! Canned documentation extractor for testing.

use crate::DocExtractor;
use crate::error::{ErrorKind, Result};
use crate::models::{DocEntry, DocPayload, SourceContext};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// [`DocExtractor`] that answers from a canned table keyed by directory base
/// name. Directories not in the table hold no package, mirroring how the
/// real extractor treats directories without source files.
#[derive(Debug, Default)]
pub struct MockExtractor {
    payloads: HashMap<String, DocPayload>,
    failing: HashSet<String>,
}

impl MockExtractor {
    /// Mock that recognises the given directory names as packages.
    pub fn with_packages(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let payloads = names
            .into_iter()
            .map(Into::into)
            .map(|name| {
                let payload = DocPayload {
                    package: name.clone(),
                    summary: format!("Documentation for {name}."),
                    entries: vec![DocEntry {
                        doc: format!("Documentation for {name}."),
                        context: SourceContext { file: "lib.rs".into(), line: 1 },
                    }],
                };
                (name, payload)
            })
            .collect();
        Self { payloads, failing: HashSet::new() }
    }

    /// Make extraction of one directory name fail.
    pub fn failing_dir(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }
}

#[async_trait]
impl DocExtractor for MockExtractor {
    async fn extract_package(&self, dir: &Path, _deadline: Duration) -> Result<Option<DocPayload>> {
        let name = dir.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        if self.failing.contains(name) {
            exn::bail!(ErrorKind::UnreadableDirectory(dir.to_path_buf()));
        }
        Ok(self.payloads.get(name).cloned())
    }
}
