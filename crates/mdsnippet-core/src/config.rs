//! Rendering configuration.
//!
//! Loaded from a TOML file; every field has a default so partial files work.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::markdown::ParseLimits;
use crate::sanitize::DEFAULT_SAMPLE_LIMIT;

/// Snapshot rasterization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Number of (width, text) entries kept by the snapshot cache.
    pub cache_capacity: usize,
    /// Widths closer than this reuse a cached snapshot.
    pub width_tolerance: f32,
    /// Line height as a multiple of the tallest font on the line.
    pub line_spacing: f32,
    /// RGBA ink colour.
    pub text_color: [u8; 4],
    /// Largest bitmap (width times height) a snapshot may allocate.
    pub max_bitmap_pixels: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1,
            width_tolerance: 0.5,
            line_spacing: 1.2,
            text_color: [0, 0, 0, 255],
            max_bitmap_pixels: 4096 * 4096,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Body text size in points.
    pub base_font_size: f32,
    /// Samples kept per category by `sanitize::describe`.
    pub sanitize_sample_limit: usize,
    pub parse: ParseLimits,
    pub snapshot: SnapshotConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_font_size: Self::DEFAULT_BASE_FONT_SIZE,
            sanitize_sample_limit: DEFAULT_SAMPLE_LIMIT,
            parse: ParseLimits::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl RenderConfig {
    const DEFAULT_BASE_FONT_SIZE: f32 = 17.0;

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(RenderConfig::default())
        }
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize config to TOML")
    }
}
