//! Service configuration module.
//!
//! Handles loading, validating, and merging the service `config.toml`. The
//! file is optional: stock defaults are overridden by whatever keys the file
//! sets, and command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! bind = "0.0.0.0:5000"        # Listen address
//! storage_dir = "storage"      # Where artifacts are written and served from
//!
//! [upload]
//! max_files = 10               # Files accepted per request
//! max_request_bytes = 52428800 # Whole-request body limit (50 MiB)
//!
//! [images]
//! quality = 80                 # Primary re-encode quality (1-100)
//! max_width = 1920             # Primary artifacts wider than this are scaled down
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Thumbnails are always 200×200 at quality 80 and have no settings.
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [images]
//! quality = 70
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listen address and storage location.
    pub server: ServerConfig,
    /// Multipart intake limits.
    pub upload: UploadConfig,
    /// Primary artifact settings (quality, width cap).
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if self.upload.max_files == 0 {
            return Err(ConfigError::Validation(
                "upload.max_files must be non-zero".into(),
            ));
        }
        if self.upload.max_request_bytes == 0 {
            return Err(ConfigError::Validation(
                "upload.max_request_bytes must be non-zero".into(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Validation("server.bind must be set".into()));
        }
        Ok(())
    }

    pub fn storage_dir(&self) -> &Path {
        &self.server.storage_dir
    }
}

/// Listen address and storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on, e.g. `"127.0.0.1:5000"`.
    pub bind: String,
    /// Directory artifacts are written to and served from.
    pub storage_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            storage_dir: PathBuf::from("storage"),
        }
    }
}

/// Multipart intake limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum number of `file` parts per request.
    pub max_files: usize,
    /// Maximum request body size in bytes.
    pub max_request_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_request_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Primary artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Re-encode quality for primary artifacts (1 = worst, 100 = best).
    pub quality: u32,
    /// Primary artifacts wider than this are scaled down to it.
    pub max_width: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: crate::types::DEFAULT_QUALITY,
            max_width: crate::imaging::operations::DEFAULT_MAX_WIDTH,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ServiceConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the service config.
///
/// With no path, returns the validated stock defaults. With a path, the file
/// must exist; its values are merged on top of the defaults, unknown keys
/// are rejected, and the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-press configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Server
# ---------------------------------------------------------------------------
[server]
# Socket address to listen on.
bind = "0.0.0.0:5000"

# Directory artifacts are written to. Its contents are also served at `/`.
storage_dir = "storage"

# ---------------------------------------------------------------------------
# Upload limits
# ---------------------------------------------------------------------------
[upload]
# Maximum number of files per request.
max_files = 10

# Maximum request body size in bytes (50 MiB).
max_request_bytes = 52428800

# ---------------------------------------------------------------------------
# Primary image settings
# ---------------------------------------------------------------------------
[images]
# Re-encode quality (1 = worst, 100 = best). Applies to lossy formats.
quality = 80

# Images wider than this are scaled down, preserving aspect ratio.
max_width = 1920

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
