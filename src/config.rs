//! Regeneration settings.
//!
//! Loaded from an optional `regen.toml` in the content root and merged over
//! stock defaults, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! uploads_dir = "uploads"      # canonical file paths are relative to this
//! catalog = "library.json"     # media catalog, relative to the content root
//!
//! [images]
//! quality = 82                 # JPEG quality (1-100)
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true                  # exact dimensions, center-cropped
//!
//! [sizes.medium]
//! width = 300                  # fit inside 300x300, keep aspect ratio
//! height = 300
//! ```
//!
//! Size tables merge by name: a user file can add sizes or change the
//! dimensions of stock ones. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the optional config file inside the content root.
pub const CONFIG_FILENAME: &str = "regen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegenConfig {
    /// Directory holding the uploaded files, relative to the content root.
    pub uploads_dir: String,
    /// Media catalog file, relative to the content root.
    pub catalog: String,
    /// Encoding settings.
    pub images: ImagesConfig,
    /// Registered sizes, keyed by name.
    pub sizes: BTreeMap<String, SizeSpec>,
}

impl Default for RegenConfig {
    fn default() -> Self {
        let mut sizes = BTreeMap::new();
        sizes.insert("thumbnail".to_string(), SizeSpec::cropped(150, 150));
        sizes.insert("medium".to_string(), SizeSpec::fit(300, 300));
        sizes.insert("large".to_string(), SizeSpec::fit(1024, 1024));
        Self {
            uploads_dir: "uploads".to_string(),
            catalog: "library.json".to_string(),
            images: ImagesConfig::default(),
            sizes,
        }
    }
}

impl RegenConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "at least one size must be registered".into(),
            ));
        }
        for (name, size) in &self.sizes {
            let valid_name = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid_name {
                return Err(ConfigError::Validation(format!(
                    "size name {name:?} may only contain letters, digits, '-' and '_'"
                )));
            }
            if size.width == 0 && size.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "sizes.{name} needs a non-zero width or height"
                )));
            }
        }
        if self.catalog.trim().is_empty() {
            return Err(ConfigError::Validation("catalog must not be empty".into()));
        }
        Ok(())
    }

    pub fn uploads_root(&self, root: &Path) -> PathBuf {
        root.join(&self.uploads_dir)
    }

    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        root.join(&self.catalog)
    }
}

/// Encoding settings for generated variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality (1 = worst, 100 = best). Lossless formats ignore it.
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 82 }
    }
}

/// One registered size.
///
/// A zero width or height leaves that side unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeSpec {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Crop to the exact box instead of fitting inside it.
    #[serde(default)]
    pub crop: bool,
}

impl SizeSpec {
    pub fn fit(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: false,
        }
    }

    pub fn cropped(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RegenConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
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

/// Load `regen.toml` from the content root as a raw TOML value.
///
/// `Ok(None)` when the file doesn't exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge user values over stock defaults, deserialize, and validate.
pub fn load_config(root: &Path) -> Result<RegenConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: RegenConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Fully-commented stock `regen.toml`, printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# regen-thumbs configuration
# ==========================
# Place this file as regen.toml in the content root passed to --path.
# All settings are optional; values below are the defaults.
# Unknown keys cause an error.

# Directory holding uploaded files, relative to the content root.
# Catalog entries store their file paths relative to this directory.
uploads_dir = "uploads"

# Media catalog (JSON), relative to the content root.
catalog = "library.json"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality (1 = worst, 100 = best). PNG, GIF, TIFF and WebP are lossless.
quality = 82

# ---------------------------------------------------------------------------
# Registered sizes
# ---------------------------------------------------------------------------
# Each [sizes.<name>] table declares one variant generated for every image.
# Variants are written next to the original as <base>-<width>x<height>.<ext>,
# where <base> is the original's file name without its extension.
#
#   width / height  Bounding box in pixels. 0 leaves that side unconstrained.
#   crop            true  = exactly width x height, center-cropped
#                   false = fit inside the box, keeping the aspect ratio
#
# Images are never upscaled: a size that would not be smaller than the
# original is skipped for that image.

[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300
crop = false

[sizes.large]
width = 1024
height = 1024
crop = false
"##
}
