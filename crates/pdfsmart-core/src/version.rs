//! PDF header version detection and range checks.
//!
//! Only the `%PDF-M.m` header comment is consulted. A catalog `/Version`
//! override is a property of the parsed document and belongs to the engine.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::engine::CompatibilityChecker;

/// Number of leading bytes searched for the header marker.
const HEADER_SEARCH_LEN: usize = 1024;

const HEADER_MARKER: &[u8] = b"%PDF-";

#[derive(Error, Debug)]
pub enum CompatibilityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no %PDF- header in the first 1024 bytes")]
    MissingHeader,
    #[error("invalid PDF version: {0:?}")]
    InvalidVersion(String),
}

/// A `major.minor` PDF version. Orders by major, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub const V1_4: PdfVersion = PdfVersion::new(1, 4);
    pub const V2_0: PdfVersion = PdfVersion::new(2, 0);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PdfVersion {
    type Err = CompatibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompatibilityError::InvalidVersion(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        let component = |part: &str| -> Result<u8, CompatibilityError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        Ok(Self::new(component(major)?, component(minor)?))
    }
}

/// Inclusive range of accepted PDF versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    min: PdfVersion,
    max: PdfVersion,
}

impl VersionRange {
    /// Returns `None` when `min > max`.
    pub fn new(min: PdfVersion, max: PdfVersion) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    pub fn min(&self) -> PdfVersion {
        self.min
    }

    pub fn max(&self) -> PdfVersion {
        self.max
    }

    pub fn contains(&self, version: PdfVersion) -> bool {
        self.min <= version && version <= self.max
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self {
            min: PdfVersion::V1_4,
            max: PdfVersion::V2_0,
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Parse the header version out of the leading bytes of a PDF.
///
/// The marker may be preceded by junk (readers are required to tolerate
/// it), so the whole buffer is searched rather than just its start.
pub fn parse_header_version(bytes: &[u8]) -> Result<PdfVersion, CompatibilityError> {
    let start = bytes
        .windows(HEADER_MARKER.len())
        .position(|w| w == HEADER_MARKER)
        .ok_or(CompatibilityError::MissingHeader)?
        + HEADER_MARKER.len();

    let rest = &bytes[start..];
    let end = rest
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .unwrap_or(rest.len());

    let raw = String::from_utf8_lossy(&rest[..end]);
    raw.parse()
}

/// Read the header version of the file at `path`.
pub fn read_header_version(path: &Path) -> Result<PdfVersion, CompatibilityError> {
    let mut buf = Vec::with_capacity(HEADER_SEARCH_LEN);
    File::open(path)?
        .take(HEADER_SEARCH_LEN as u64)
        .read_to_end(&mut buf)?;
    parse_header_version(&buf)
}

/// Accepts files whose header version lies in a [`VersionRange`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderChecker {
    range: VersionRange,
}

impl HeaderChecker {
    pub fn new(range: VersionRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> VersionRange {
        self.range
    }
}

impl CompatibilityChecker for HeaderChecker {
    fn check(&self, path: &Path) -> bool {
        match read_header_version(path) {
            Ok(version) => {
                let accepted = self.range.contains(version);
                tracing::debug!(
                    path = %path.display(),
                    %version,
                    range = %self.range,
                    accepted,
                    "compatibility check"
                );
                accepted
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "compatibility check failed");
                false
            }
        }
    }
}

/// Check `path` against the default range, 1.4 through 2.0.
pub fn check_pdf_compatibility(path: &Path) -> bool {
    HeaderChecker::default().check(path)
}
