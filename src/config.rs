//! Conversion configuration module.
//!
//! Handles loading, validating, and merging `md2storage.toml` files. Stock
//! defaults are overridden by the config file, which is in turn overridden
//! by command-line flags.
//!
//! ## Config File Location
//!
//! Pass `--config <FILE>` explicitly, or place `md2storage.toml` in the
//! directory being converted:
//!
//! ```text
//! docs/
//! ├── md2storage.toml          # Picked up automatically
//! ├── index.md
//! └── guide/
//!     ├── setup.md
//!     └── screenshot.png
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! width = 760               # Target display width in pixels (must be > 0)
//! responsive = true         # Emit width/data-width/data-height/style attributes
//! scaling = "fixed"         # "fixed" or "shrink-only"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Invalid values (such as a
//! zero width) are rejected at load time, never silently corrected.

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Display width used when neither the config file nor the caller sets one.
pub const DEFAULT_IMAGE_WIDTH: u32 = 760;

/// File name looked up in the source directory when `--config` is absent.
pub const CONFIG_FILENAME: &str = "md2storage.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How the configured width is applied to images of different sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scaling {
    /// Every image renders at the configured width, small images included.
    /// Keeps a document's images on a uniform layout.
    #[default]
    Fixed,
    /// Images narrower than the configured width keep their own width.
    ShrinkOnly,
}

/// Configuration loaded from `md2storage.toml`.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Responsive image settings.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.width == 0 {
            return Err(ConfigError::Validation(
                "images.width must be greater than 0".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the per-conversion options from a validated config.
    pub fn conversion_options(&self) -> Result<ConversionOptions, ConfigError> {
        self.validate()?;
        Ok(ConversionOptions {
            responsive: self.images.responsive,
            scaling: self.images.scaling,
            ..ConversionOptions::with_image_width(self.images.width)?
        })
    }
}

/// Responsive image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Target display width in pixels.
    pub width: u32,
    /// Whether probed images receive responsive sizing attributes.
    pub responsive: bool,
    /// How `width` applies to images narrower than it.
    pub scaling: Scaling,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_WIDTH,
            responsive: true,
            scaling: Scaling::default(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent, defaults to the number of CPU cores.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Options threaded through one conversion run.
///
/// Constructed once and passed by reference into every call site. The width
/// is a `NonZeroU32`, so a zero width cannot exist past construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    pub image_width: NonZeroU32,
    pub responsive: bool,
    pub scaling: Scaling,
}

impl ConversionOptions {
    /// Options with the given target width and default everything else.
    pub fn with_image_width(width: u32) -> Result<Self, ConfigError> {
        let image_width = NonZeroU32::new(width).ok_or_else(|| {
            ConfigError::Validation("image width must be greater than 0".into())
        })?;
        Ok(Self {
            image_width,
            responsive: true,
            scaling: Scaling::default(),
        })
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            image_width: NonZeroU32::new(DEFAULT_IMAGE_WIDTH).unwrap_or(NonZeroU32::MIN),
            responsive: true,
            scaling: Scaling::default(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that file values and CLI overrides merge onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Locate `md2storage.toml` for a source path (a file's directory, or the
/// directory itself).
pub fn find_config(source: &Path) -> Option<PathBuf> {
    let dir = if source.is_dir() {
        source
    } else {
        source.parent()?
    };
    let candidate = dir.join(CONFIG_FILENAME);
    candidate.is_file().then_some(candidate)
}

/// Merge optional layers onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(layers: impl IntoIterator<Item = toml::Value>) -> Result<Config, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file on top of the stock defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    resolve_config([load_raw_config(path)?])
}

/// Build a TOML overlay from a command-line `--image-width` flag.
pub fn image_width_overlay(width: u32) -> toml::Value {
    let mut images = toml::Table::new();
    images.insert("width".into(), toml::Value::Integer(i64::from(width)));
    let mut root = toml::Table::new();
    root.insert("images".into(), toml::Value::Table(images));
    toml::Value::Table(root)
}

/// Returns a fully-commented stock `md2storage.toml` with all defaults.
pub fn stock_config_toml() -> &'static str {
    r##"# md2storage configuration
# ========================
#
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Responsive images
# ---------------------------------------------------------------------------
[images]
# Target display width in pixels. Must be greater than 0.
# Overridden by --image-width on the command line.
width = 760

# Emit width, data-width, data-height and style attributes on images whose
# pixel dimensions can be read. Images that cannot be probed (missing files,
# SVG, remote URLs) are always emitted without them.
responsive = true

# "fixed"       every image renders at `width`, small images included
# "shrink-only" images narrower than `width` keep their own width
scaling = "fixed"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
