use std::path::{Path, PathBuf};

use mupdf::MetadataName;
use mupdf::pdf::{PdfDocument, PdfWriteOptions};

use pdfsmart_core::engine::is_same_file;
use pdfsmart_core::{EngineError, GarbageLevel, PdfEngine, PdfHandle, SaveOptions};

/// Opens PDFs with MuPDF.
///
/// Only this crate links the native library. `pdfsmart-core` and its
/// manager tests build against the mock engine and never need a C
/// toolchain or libclang.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfEngine;

impl MupdfEngine {
    pub fn new() -> Self {
        Self
    }
}

fn path_str(path: &Path) -> Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("invalid path encoding: {}", path.display()))
}

impl PdfEngine for MupdfEngine {
    type Document = MupdfDocument;

    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn open(&self, path: &Path) -> Result<MupdfDocument, EngineError> {
        let path_str = path_str(path).map_err(EngineError::Open)?;
        let inner = PdfDocument::open(path_str).map_err(|e| EngineError::Open(e.to_string()))?;
        tracing::trace!(path = path_str, "mupdf document opened");
        Ok(MupdfDocument {
            inner,
            source: path.to_path_buf(),
        })
    }
}

/// An open MuPDF document. Dropping it frees the underlying `pdf_document`.
pub struct MupdfDocument {
    inner: PdfDocument,
    source: PathBuf,
}

impl MupdfDocument {
    /// File this document was opened from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The underlying MuPDF document, for operations beyond [`PdfHandle`].
    pub fn as_pdf(&self) -> &PdfDocument {
        &self.inner
    }

    pub fn as_pdf_mut(&mut self) -> &mut PdfDocument {
        &mut self.inner
    }
}

fn write_options(options: &SaveOptions) -> PdfWriteOptions {
    let mut opts = PdfWriteOptions::default();
    // MuPDF garbage levels: 1 drops unused objects, 3 also merges duplicates.
    let garbage = match options.garbage {
        GarbageLevel::None => 0,
        GarbageLevel::Compact => 1,
        GarbageLevel::Deduplicate => 3,
    };
    opts.set_compress(options.compress);
    opts.set_incremental(options.incremental);
    opts.set_garbage_level(garbage);
    opts
}

impl PdfHandle for MupdfDocument {
    fn save(&self, path: &Path, options: &SaveOptions) -> Result<(), EngineError> {
        // MuPDF appends the incremental section to whatever file it is given,
        // so any other target ends up without a header or base objects.
        if options.incremental && !is_same_file(path, &self.source) {
            return Err(EngineError::Save(format!(
                "incremental save to {} would not contain {}",
                path.display(),
                self.source.display()
            )));
        }
        let path_str = path_str(path).map_err(EngineError::Save)?;
        self.inner
            .save_with_options(path_str, write_options(options))
            .map_err(|e| EngineError::Save(e.to_string()))
    }

    fn close(self) {
        drop(self.inner);
    }

    fn page_count(&self) -> Result<usize, EngineError> {
        let count = self
            .inner
            .page_count()
            .map_err(|e| EngineError::Query(e.to_string()))?;
        usize::try_from(count).map_err(|_| EngineError::Query(format!("negative page count {count}")))
    }

    fn format(&self) -> Result<String, EngineError> {
        self.inner
            .metadata(MetadataName::Format)
            .map_err(|e| EngineError::Query(e.to_string()))
    }

    fn needs_password(&self) -> Result<bool, EngineError> {
        self.inner
            .needs_password()
            .map_err(|e| EngineError::Query(e.to_string()))
    }
}
