//! Leading-comment documentation extractor.
//!
//! This is the thin adapter that makes the server runnable without a real
//! language parser: any file with a recognised source extension counts as
//! part of a package, and the comment block at the very top of each file is
//! taken as its documentation. Files are read per-directory only; recursion
//! is the walker's job.

use crate::error::{ErrorKind, Result};
use crate::models::{DocEntry, DocPayload, SourceContext};
use crate::{DocExtractor, is_source_file};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// Comment prefix used by a source file, judged by extension.
fn comment_prefix(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py" | "rb" | "sh") => "#",
        _ => "//",
    }
}

/// Extract the leading comment block from file contents.
///
/// Returns the block with comment markers stripped, or an empty string when
/// the file does not start with a comment.
fn leading_comment(contents: &str, prefix: &str) -> String {
    let mut lines = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            // Also swallows doc-comment markers like `///` and `//!`.
            let rest = rest.trim_start_matches(['/', '!']).strip_prefix(' ').unwrap_or_else(|| {
                rest.trim_start_matches(['/', '!'])
            });
            lines.push(rest);
        } else if trimmed.is_empty() && lines.is_empty() {
            // Leading blank lines before the block are fine.
            continue;
        } else {
            break;
        }
    }
    lines.join("\n").trim().to_string()
}

/// [`DocExtractor`] that reads header comments from source files.
#[derive(Debug, Clone, Default)]
pub struct HeaderCommentExtractor;

impl HeaderCommentExtractor {
    async fn extract_inner(&self, dir: &Path) -> Result<Option<DocPayload>> {
        let mut sources: Vec<PathBuf> = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.map_err(ErrorKind::Io)?;
        while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && is_source_file(&path) {
                sources.push(path);
            }
        }
        if sources.is_empty() {
            // Not an error: this directory simply holds no package.
            return Ok(None);
        }
        sources.sort_unstable();

        let package = dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("root")
            .to_string();
        let mut payload = DocPayload::undocumented(package);
        for source in sources {
            let contents = tokio::fs::read_to_string(&source).await.map_err(ErrorKind::Io)?;
            let doc = leading_comment(&contents, comment_prefix(&source));
            if doc.is_empty() {
                continue;
            }
            let file = source.strip_prefix(dir).unwrap_or(&source).to_path_buf();
            payload.entries.push(DocEntry { doc, context: SourceContext { file, line: 1 } });
        }
        if payload.summary.is_empty()
            && let Some(first) = payload.entries.first()
        {
            payload.summary = first.doc.lines().next().unwrap_or_default().to_string();
        }
        Ok(Some(payload))
    }
}

#[async_trait]
impl DocExtractor for HeaderCommentExtractor {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn extract_package(&self, dir: &Path, deadline: Duration) -> Result<Option<DocPayload>> {
        tokio::time::timeout(deadline, self.extract_inner(dir))
            .await
            .map_err(|_| ErrorKind::Timeout(deadline))?
    }
}
