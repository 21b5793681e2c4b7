//! Lifecycle management for a single open PDF document.

use std::path::{Path, PathBuf};

use crate::config_file::Config;
use crate::engine::{CompatibilityChecker, PdfEngine, PdfHandle, SaveOptions, is_same_file};
use crate::error::DocumentError;
use crate::version::HeaderChecker;

/// A document handle together with the path it was opened from.
#[derive(Debug)]
pub struct LoadedDocument<D> {
    handle: D,
    path: PathBuf,
}

impl<D> LoadedDocument<D> {
    pub fn handle(&self) -> &D {
        &self.handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether a manager currently holds a document.
#[derive(Debug)]
pub enum DocumentState<D> {
    Empty,
    Loaded(LoadedDocument<D>),
}

impl<D> Default for DocumentState<D> {
    fn default() -> Self {
        DocumentState::Empty
    }
}

/// Summary of the loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub page_count: usize,
    /// Engine format string, e.g. `"PDF 1.7"`.
    pub format: String,
    pub encrypted: bool,
}

/// Owns at most one open document and mediates every operation on it.
///
/// Engine failures are wrapped into [`DocumentError`] at the call site and
/// never change the held state: a failed `load` keeps whatever was loaded
/// before, and a failed `save` leaves the in-memory document untouched.
pub struct DocumentManager<E: PdfEngine, C = HeaderChecker> {
    engine: E,
    checker: C,
    save_options: SaveOptions,
    state: DocumentState<E::Document>,
}

impl<E: PdfEngine> DocumentManager<E> {
    /// Manager with the default 1.4 to 2.0 header check and default save options.
    pub fn new(engine: E) -> Self {
        Self::with_checker(engine, HeaderChecker::default())
    }

    pub fn from_config(engine: E, config: &Config) -> Self {
        Self::with_checker(engine, HeaderChecker::new(config.compatibility_range))
            .with_save_options(config.save_options)
    }
}

impl<E: PdfEngine, C: CompatibilityChecker> DocumentManager<E, C> {
    pub fn with_checker(engine: E, checker: C) -> Self {
        Self {
            engine,
            checker,
            save_options: SaveOptions::default(),
            state: DocumentState::Empty,
        }
    }

    /// Options used by [`save`](Self::save).
    pub fn with_save_options(mut self, options: SaveOptions) -> Self {
        self.save_options = options;
        self
    }

    pub fn save_options(&self) -> &SaveOptions {
        &self.save_options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self) -> &DocumentState<E::Document> {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, DocumentState::Loaded(_))
    }

    /// Path the current document was loaded from.
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            DocumentState::Loaded(doc) => Some(doc.path()),
            DocumentState::Empty => None,
        }
    }

    /// Open `path` and make it the current document.
    ///
    /// The new file is opened before anything else happens. Only once that
    /// succeeds is a previously held document closed and replaced, so a
    /// failed load leaves the manager exactly as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let handle = match self.engine.open(path) {
            Ok(handle) => handle,
            Err(source) => {
                tracing::warn!(
                    engine = self.engine.name(),
                    path = %path.display(),
                    error = %source,
                    "failed to load PDF"
                );
                return Err(DocumentError::Load {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if let DocumentState::Loaded(previous) = std::mem::take(&mut self.state) {
            tracing::debug!(path = %previous.path.display(), "releasing previously loaded document");
            previous.handle.close();
        }

        tracing::info!(engine = self.engine.name(), path = %path.display(), "loaded PDF");
        self.state = DocumentState::Loaded(LoadedDocument {
            handle,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Write the current document to `path` with the manager's save options.
    ///
    /// Incremental saves are only accepted when `path` is the file the
    /// document was loaded from.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        self.save_with_options(path, &self.save_options)
    }

    pub fn save_with_options(
        &self,
        path: impl AsRef<Path>,
        options: &SaveOptions,
    ) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let DocumentState::Loaded(doc) = &self.state else {
            return Err(DocumentError::no_document());
        };
        if options.incremental && !is_same_file(path, &doc.path) {
            return Err(DocumentError::InvalidOperation(format!(
                "incremental save must target the source file {}, not {}",
                doc.path.display(),
                path.display()
            )));
        }

        doc.handle.save(path, options).map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "failed to save PDF");
            DocumentError::Save {
                path: path.to_path_buf(),
                source,
            }
        })?;

        tracing::info!(path = %path.display(), ?options, "saved PDF");
        Ok(())
    }

    /// The current document, if any.
    pub fn get(&self) -> Option<&E::Document> {
        match &self.state {
            DocumentState::Loaded(doc) => Some(&doc.handle),
            DocumentState::Empty => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut E::Document> {
        match &mut self.state {
            DocumentState::Loaded(doc) => Some(&mut doc.handle),
            DocumentState::Empty => None,
        }
    }

    /// Release the current document. Does nothing when none is loaded.
    pub fn close(&mut self) {
        if let DocumentState::Loaded(doc) = std::mem::take(&mut self.state) {
            tracing::debug!(path = %doc.path.display(), "closing document");
            doc.handle.close();
        }
    }

    /// Whether the PDF at `path` is acceptable input. Independent of the
    /// loaded document.
    pub fn check_compatibility(&self, path: impl AsRef<Path>) -> bool {
        self.checker.check(path.as_ref())
    }

    pub fn info(&self) -> Result<DocumentInfo, DocumentError> {
        let DocumentState::Loaded(doc) = &self.state else {
            return Err(DocumentError::no_document());
        };
        Ok(DocumentInfo {
            path: doc.path.clone(),
            page_count: doc.handle.page_count()?,
            format: doc.handle.format()?,
            encrypted: doc.handle.needs_password()?,
        })
    }
}
