use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to write PDF: {0}")]
    Save(String),
    #[error("failed to query document: {0}")]
    Query(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How aggressively unused objects are dropped when a document is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarbageLevel {
    /// Keep every object, even unreferenced ones.
    #[default]
    None,
    /// Drop unreferenced objects and compact the xref table.
    Compact,
    /// Compact, then merge duplicate objects.
    Deduplicate,
}

/// Engine-neutral write options for [`PdfHandle::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub compress: bool,
    pub garbage: GarbageLevel,
    /// Append changes to the file the document was opened from. Only valid
    /// when saving back to that same file.
    pub incremental: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compress: true,
            garbage: GarbageLevel::None,
            incremental: false,
        }
    }
}

/// Whether `a` and `b` name the same file. Falls back to comparing the
/// paths as given when either side cannot be canonicalized (e.g. it does
/// not exist yet).
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Trait for PDF engines that can open a file into an in-memory document.
///
/// Parsing, rendering and serialization all live behind this seam; the
/// [`DocumentManager`](crate::DocumentManager) only sequences calls into it.
pub trait PdfEngine {
    type Document: PdfHandle;

    /// Short engine name, used in log fields.
    fn name(&self) -> &'static str;

    /// Open the PDF at `path`.
    fn open(&self, path: &Path) -> Result<Self::Document, EngineError>;
}

/// An open document owned by a [`PdfEngine`].
pub trait PdfHandle {
    /// Serialize the document to `path`, overwriting any existing file.
    ///
    /// With `options.incremental` set, `path` must be the file the document
    /// was opened from; implementations reject any other destination.
    fn save(&self, path: &Path, options: &SaveOptions) -> Result<(), EngineError>;

    /// Release the engine resources held by this document.
    fn close(self);

    fn page_count(&self) -> Result<usize, EngineError>;

    /// Engine-reported format string, e.g. `"PDF 1.7"`.
    fn format(&self) -> Result<String, EngineError>;

    fn needs_password(&self) -> Result<bool, EngineError>;
}

/// Decides whether a file on disk is acceptable input.
pub trait CompatibilityChecker {
    fn check(&self, path: &Path) -> bool;
}

impl<F> CompatibilityChecker for F
where
    F: Fn(&Path) -> bool,
{
    fn check(&self, path: &Path) -> bool {
        self(path)
    }
}
