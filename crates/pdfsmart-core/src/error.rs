use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to load PDF from {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("failed to save PDF to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl DocumentError {
    pub(crate) fn no_document() -> Self {
        DocumentError::InvalidOperation("No document is currently loaded.".into())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("invalid version in config: {0}")]
    Version(#[from] crate::version::CompatibilityError),
    #[error("compatibility range is empty: min {min} is above max {max}")]
    EmptyRange { min: String, max: String },
}
