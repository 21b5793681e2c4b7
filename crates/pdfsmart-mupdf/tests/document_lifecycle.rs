//! End-to-end tests for [`DocumentManager`] backed by the real MuPDF engine.
//!
//! Fixtures are minimal, well-formed PDFs generated on the fly with an
//! exact xref table, so every test owns its files inside a temp dir.

use std::path::{Path, PathBuf};

use mupdf::MetadataName;
use pdfsmart_core::{
    DocumentError, DocumentManager, EngineError, GarbageLevel, PdfHandle, SaveOptions,
};
use pdfsmart_mupdf::{MupdfDocument, MupdfEngine};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Page sizes cycled through by [`minimal_pdf`]: US letter, A4 landscape, A5.
const MEDIA_BOXES: [[u32; 4]; 3] = [[0, 0, 612, 792], [0, 0, 842, 595], [0, 0, 420, 595]];

const FIXTURE_TITLE: &str = "Quarterly Report";

/// Build a PDF with `pages` blank pages, an Info dictionary and the given
/// header version. Page `i` uses `MEDIA_BOXES[i % 3]`.
fn minimal_pdf(version: &str, pages: usize) -> Vec<u8> {
    let kids = (0..pages)
        .map(|i| format!("{} 0 R", i + 3))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {pages} >>"),
    ];
    for i in 0..pages {
        let [x0, y0, x1, y1] = MEDIA_BOXES[i % MEDIA_BOXES.len()];
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [{x0} {y0} {x1} {y1}] >>"
        ));
    }
    objects.push(format!("<< /Title ({FIXTURE_TITLE}) /Producer (pdfsmart tests) >>"));
    let info_id = objects.len();

    let mut out = format!("%PDF-{version}\n").into_bytes();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = out.len();
    let size = objects.len() + 1;
    let mut tail = format!("xref\n0 {size}\n0000000000 65535 f \n");
    for offset in offsets {
        tail.push_str(&format!("{offset:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {size} /Root 1 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
    ));
    out.extend_from_slice(tail.as_bytes());
    out
}

/// `(x0, y0, x1, y1)` of every page, in order.
fn page_bounds(doc: &MupdfDocument) -> Vec<(f32, f32, f32, f32)> {
    doc.as_pdf()
        .pages()
        .unwrap()
        .map(|page| {
            let b = page.unwrap().bounds().unwrap();
            (b.x0, b.y0, b.x1, b.y1)
        })
        .collect()
}

fn title(doc: &MupdfDocument) -> String {
    doc.as_pdf().metadata(MetadataName::Title).unwrap()
}

fn incremental() -> SaveOptions {
    SaveOptions {
        compress: false,
        garbage: GarbageLevel::None,
        incremental: true,
    }
}

fn write_pdf(dir: &Path, name: &str, version: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, minimal_pdf(version, pages)).unwrap();
    path
}

fn manager() -> DocumentManager<MupdfEngine> {
    DocumentManager::new(MupdfEngine::new())
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn load_then_get_returns_document() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 2);
    let mut m = manager();

    m.load(&a).unwrap();

    let doc = m.get().expect("document should be loaded");
    assert_eq!(doc.page_count().unwrap(), 2);
    assert_eq!(m.current_path(), Some(a.as_path()));
}

#[test]
fn load_missing_file_leaves_manager_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = manager();

    let err = m.load(dir.path().join("nope.pdf")).unwrap_err();
    assert!(matches!(err, DocumentError::Load { .. }));
    assert!(m.get().is_none());
}

#[test]
fn load_failure_keeps_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 3);
    let mut m = manager();

    m.load(&a).unwrap();
    assert!(m.load(dir.path().join("nope.pdf")).is_err());

    assert_eq!(m.current_path(), Some(a.as_path()));
    assert_eq!(m.get().unwrap().page_count().unwrap(), 3);
}

#[test]
fn load_invalid_pdf_keeps_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 2);
    let junk = dir.path().join("junk.pdf");
    std::fs::write(&junk, b"not a pdf").unwrap();
    let mut m = manager();

    m.load(&a).unwrap();
    match m.load(&junk).unwrap_err() {
        DocumentError::Load { path, source } => {
            assert_eq!(path, junk);
            assert!(matches!(source, EngineError::Open(_)));
        }
        other => panic!("expected Load error, got {other}"),
    }

    assert_eq!(m.current_path(), Some(a.as_path()));
    assert_eq!(m.get().unwrap().page_count().unwrap(), 2);
}

#[test]
fn reload_replaces_document() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 1);
    let b = write_pdf(dir.path(), "b.pdf", "1.7", 4);
    let mut m = manager();

    m.load(&a).unwrap();
    m.load(&b).unwrap();

    assert_eq!(m.current_path(), Some(b.as_path()));
    assert_eq!(m.get().unwrap().page_count().unwrap(), 4);
}

#[test]
fn save_without_document_is_invalid_operation() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();

    let err = m.save(dir.path().join("out.pdf")).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidOperation(_)));
    assert!(!dir.path().join("out.pdf").exists());
}

#[test]
fn close_then_get_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 1);
    let mut m = manager();

    m.load(&a).unwrap();
    m.close();

    assert!(m.get().is_none());
    assert!(matches!(
        m.save(dir.path().join("out.pdf")),
        Err(DocumentError::InvalidOperation(_))
    ));
}

#[test]
fn close_twice_and_on_fresh_manager() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 1);

    let mut fresh = manager();
    fresh.close();
    fresh.close();

    let mut m = manager();
    m.load(&a).unwrap();
    m.close();
    m.close();
    assert!(!m.is_loaded());
}

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 1);
    let mut m = manager();

    m.load(&a).unwrap();
    let target = dir.path().join("no").join("such").join("dir").join("out.pdf");
    match m.save(&target).unwrap_err() {
        DocumentError::Save { path, .. } => assert_eq!(path, target),
        other => panic!("expected Save error, got {other}"),
    }
    assert!(m.is_loaded());
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 3);
    let b = dir.path().join("b.pdf");
    let mut m = manager();

    m.load(&a).unwrap();
    let original = m.info().unwrap();
    let original_bounds = page_bounds(m.get().unwrap());
    m.save(&b).unwrap();
    m.close();

    m.load(&b).unwrap();
    let reloaded = m.info().unwrap();
    let doc = m.get().unwrap();
    assert_eq!(reloaded.page_count, original.page_count);
    assert_eq!(page_bounds(doc), original_bounds);
    assert_eq!(
        original_bounds,
        vec![
            (0.0, 0.0, 612.0, 792.0),
            (0.0, 0.0, 842.0, 595.0),
            (0.0, 0.0, 420.0, 595.0),
        ]
    );
    assert_eq!(title(doc), FIXTURE_TITLE);
    assert!(reloaded.format.starts_with("PDF"), "format {:?}", reloaded.format);
    assert!(!reloaded.encrypted);
}

#[test]
fn round_trip_with_garbage_collection() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.4", 2);
    let b = dir.path().join("b.pdf");
    let mut m = manager();

    m.load(&a).unwrap();
    m.save_with_options(
        &b,
        &SaveOptions {
            compress: true,
            garbage: GarbageLevel::Deduplicate,
            incremental: false,
        },
    )
    .unwrap();

    m.load(&b).unwrap();
    let doc = m.get().unwrap();
    assert_eq!(
        page_bounds(doc),
        vec![(0.0, 0.0, 612.0, 792.0), (0.0, 0.0, 842.0, 595.0)]
    );
    assert_eq!(title(doc), FIXTURE_TITLE);
}

#[test]
fn incremental_save_to_new_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 2);
    let b = dir.path().join("b.pdf");
    let mut m = manager();

    m.load(&a).unwrap();
    assert!(matches!(
        m.save_with_options(&b, &incremental()),
        Err(DocumentError::InvalidOperation(_))
    ));
    assert!(matches!(
        m.get().unwrap().save(&b, &incremental()),
        Err(EngineError::Save(_))
    ));
    assert!(!b.exists());

    let other = write_pdf(dir.path(), "other.pdf", "1.7", 1);
    let before = std::fs::read(&other).unwrap();
    assert!(m.get().unwrap().save(&other, &incremental()).is_err());
    assert_eq!(std::fs::read(&other).unwrap(), before);
}

#[test]
fn incremental_save_back_to_source() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 2);
    let mut m = manager();

    m.load(&a).unwrap();
    let original_bounds = page_bounds(m.get().unwrap());
    m.save_with_options(&a, &incremental()).unwrap();
    m.close();

    assert!(m.check_compatibility(&a));
    m.load(&a).unwrap();
    let doc = m.get().unwrap();
    assert_eq!(page_bounds(doc), original_bounds);
    assert_eq!(title(doc), FIXTURE_TITLE);
}

#[test]
fn saved_copy_is_compatible() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", "1.7", 1);
    let b = dir.path().join("b.pdf");
    let mut m = manager();

    m.load(&a).unwrap();
    m.save(&b).unwrap();
    assert!(m.check_compatibility(&b));
}

// ---------------------------------------------------------------------------
// Compatibility
// ---------------------------------------------------------------------------

#[test]
fn compatibility_range_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager();

    for (version, expected) in [
        ("1.3", false),
        ("1.4", true),
        ("1.7", true),
        ("2.0", true),
        ("2.1", false),
    ] {
        let path = write_pdf(dir.path(), &format!("v{version}.pdf"), version, 1);
        assert_eq!(m.check_compatibility(&path), expected, "PDF {version}");
    }
    assert!(!m.is_loaded());
}
