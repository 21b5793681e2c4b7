use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{GarbageLevel, SaveOptions};
use crate::error::ConfigError;
use crate::version::{PdfVersion, VersionRange};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub compatibility: Option<CompatibilityConfig>,
    pub save: Option<SaveConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatibilityConfig {
    pub min_version: Option<String>,
    pub max_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveConfig {
    pub compress: Option<bool>,
    pub garbage: Option<GarbageLevel>,
    pub incremental: Option<bool>,
}

/// Resolved settings for a [`DocumentManager`](crate::DocumentManager).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub compatibility_range: VersionRange,
    pub save_options: SaveOptions,
}

impl Config {
    /// Fill unset fields with defaults and validate the version range.
    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let compat = file.compatibility.clone().unwrap_or_default();
        let min = match compat.min_version.as_deref() {
            Some(s) => s.parse::<PdfVersion>()?,
            None => defaults.compatibility_range.min(),
        };
        let max = match compat.max_version.as_deref() {
            Some(s) => s.parse::<PdfVersion>()?,
            None => defaults.compatibility_range.max(),
        };
        let compatibility_range =
            VersionRange::new(min, max).ok_or_else(|| ConfigError::EmptyRange {
                min: min.to_string(),
                max: max.to_string(),
            })?;

        let save = file.save.clone().unwrap_or_default();
        let save_options = SaveOptions {
            compress: save.compress.unwrap_or(defaults.save_options.compress),
            garbage: save.garbage.unwrap_or(defaults.save_options.garbage),
            incremental: save.incremental.unwrap_or(defaults.save_options.incremental),
        };

        Ok(Config {
            compatibility_range,
            save_options,
        })
    }
}

/// `<config_dir>/pdfsmart/config.toml`, or `None` on platforms without a
/// user config directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfsmart").join("config.toml"))
}

/// Per-project settings file, looked up relative to the working directory.
pub const PROJECT_CONFIG: &str = ".pdfsmart.toml";

/// User-wide settings, then the project file on top of them.
pub fn load_config() -> ConfigFile {
    load_layers(config_path().into_iter().chain([PathBuf::from(PROJECT_CONFIG)]))
}

/// Fold the readable files among `layers` into one config. Later layers
/// override earlier ones key by key; missing or broken files are skipped.
pub fn load_layers(layers: impl IntoIterator<Item = PathBuf>) -> ConfigFile {
    layers
        .into_iter()
        .filter_map(|path| load_from_path(&path))
        .reduce(merge)
        .unwrap_or_default()
}

/// Parse one TOML file. A missing file is `None`; a file that fails to parse
/// is logged and also `None`.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
            None
        }
    }
}

/// Key-by-key union of two configs. A key set in `overlay` replaces the one
/// in `base`; a section absent from both stays absent.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        compatibility: merge_section(base.compatibility, overlay.compatibility, |b, o| {
            CompatibilityConfig {
                min_version: o.min_version.or(b.min_version),
                max_version: o.max_version.or(b.max_version),
            }
        }),
        save: merge_section(base.save, overlay.save, |b, o| SaveConfig {
            compress: o.compress.or(b.compress),
            garbage: o.garbage.or(b.garbage),
            incremental: o.incremental.or(b.incremental),
        }),
    }
}

fn merge_section<T>(
    base: Option<T>,
    overlay: Option<T>,
    both: impl FnOnce(T, T) -> T,
) -> Option<T> {
    match (base, overlay) {
        (Some(b), Some(o)) => Some(both(b, o)),
        (b, o) => o.or(b),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
