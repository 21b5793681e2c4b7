pub mod config_file;
pub mod engine;
pub mod error;
pub mod manager;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod version;

// Re-export for convenience
pub use config_file::{Config, ConfigFile, load_config, load_layers};
pub use engine::{
    CompatibilityChecker, EngineError, GarbageLevel, PdfEngine, PdfHandle, SaveOptions,
};
pub use error::{ConfigError, DocumentError};
pub use manager::{DocumentInfo, DocumentManager, DocumentState, LoadedDocument};
pub use version::{
    CompatibilityError, HeaderChecker, PdfVersion, VersionRange, check_pdf_compatibility,
    read_header_version,
};
