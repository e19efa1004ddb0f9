//! Documentation payload models.
//!
//! The sync pipeline treats [`DocPayload`] as opaque: it is produced here,
//! carried through a generation, and read again only by the presentation
//! layer. Nothing in between inspects it.

use std::path::PathBuf;

/// Structured documentation extracted from one package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPayload {
    /// Package name, usually the directory's base name.
    pub package: String,
    /// Short one-paragraph description, if any documentation was found.
    pub summary: String,
    /// Per-file documentation blocks with their parse context.
    pub entries: Vec<DocEntry>,
}

/// One extracted documentation block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    /// The documentation text, comment markers stripped.
    pub doc: String,
    /// Where in the source tree the block was found.
    pub context: SourceContext,
}

/// Parse/position context for a documentation block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    /// Source file, relative to the package directory.
    pub file: PathBuf,
    /// 1-based line the block starts on.
    pub line: u32,
}

impl DocPayload {
    /// Payload for a package that has source files but no documentation.
    pub fn undocumented(package: impl Into<String>) -> Self {
        Self { package: package.into(), summary: String::new(), entries: Vec::new() }
    }
}
