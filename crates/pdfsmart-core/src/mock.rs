//! Mock PDF engine for testing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{EngineError, PdfEngine, PdfHandle, SaveOptions, is_same_file};

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    saved: AtomicUsize,
    closed: Mutex<Vec<usize>>,
}

/// A hand-rolled mock implementing [`PdfEngine`] for tests.
///
/// Supports:
/// - Scripted open failures for specific paths (nonexistent paths fail too).
/// - Scripted save failures for every document it hands out.
/// - Counting opens and saves, and recording which documents were closed.
#[derive(Debug, Default)]
pub struct MockEngine {
    failing_paths: Mutex<HashSet<PathBuf>>,
    fail_saves: bool,
    require_existing: bool,
    counters: Arc<Counters>,
}

impl MockEngine {
    /// A mock that opens any path, existing or not.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to open paths that do not exist on disk.
    pub fn requiring_existing_files(mut self) -> Self {
        self.require_existing = true;
        self
    }

    /// Every document handed out by this engine fails to save.
    pub fn with_failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Make `open` fail for `path` as if the file were corrupt.
    pub fn fail_open(&self, path: impl Into<PathBuf>) {
        if let Ok(mut paths) = self.failing_paths.lock() {
            paths.insert(path.into());
        }
    }

    pub fn open_count(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.counters.saved.load(Ordering::SeqCst)
    }

    /// Ids of closed documents, in close order.
    pub fn closed_ids(&self) -> Vec<usize> {
        self.counters
            .closed
            .lock()
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl PdfEngine for MockEngine {
    type Document = MockDocument;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn open(&self, path: &Path) -> Result<MockDocument, EngineError> {
        let scripted = self
            .failing_paths
            .lock()
            .map(|paths| paths.contains(path))
            .unwrap_or(false);
        if scripted {
            return Err(EngineError::Open(format!(
                "cannot parse {}: corrupt data",
                path.display()
            )));
        }
        if self.require_existing && !path.exists() {
            return Err(EngineError::Open(format!(
                "no such file: {}",
                path.display()
            )));
        }

        let id = self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockDocument {
            id,
            source: path.to_path_buf(),
            fail_saves: self.fail_saves,
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Document handle produced by [`MockEngine`]. Ids count up from 0 in open order.
#[derive(Debug)]
pub struct MockDocument {
    id: usize,
    source: PathBuf,
    fail_saves: bool,
    counters: Arc<Counters>,
}

impl MockDocument {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl PdfHandle for MockDocument {
    fn save(&self, path: &Path, options: &SaveOptions) -> Result<(), EngineError> {
        if options.incremental && !is_same_file(path, &self.source) {
            return Err(EngineError::Save(format!(
                "incremental save outside {}",
                self.source.display()
            )));
        }
        if self.fail_saves {
            return Err(EngineError::Save("disk full".into()));
        }
        std::fs::write(path, format!("%PDF-1.7\n% copy of {}\n", self.source.display()))?;
        self.counters.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(self) {
        if let Ok(mut closed) = self.counters.closed.lock() {
            closed.push(self.id);
        }
    }

    fn page_count(&self) -> Result<usize, EngineError> {
        Ok(1)
    }

    fn format(&self) -> Result<String, EngineError> {
        Ok("PDF 1.7".into())
    }

    fn needs_password(&self) -> Result<bool, EngineError> {
        Ok(false)
    }
}
