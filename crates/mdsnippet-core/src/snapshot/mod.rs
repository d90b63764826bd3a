//! Snapshot rasterization.
//!
//! A [`Rasterizer`] lays a styled document out at a fixed width and paints
//! it into a transparent RGBA bitmap of exactly the measured height. Results
//! are memoized per (width, sanitized text) in a small [`SnapshotCache`].

mod backend;
mod cache;
mod layout;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use image::RgbaImage;

pub use backend::{FontMetrics, GlyphBoxBackend, TextBackend};
pub use cache::SnapshotCache;
pub use layout::{LayoutLine, PositionedRun, TextLayout, layout_document};

use crate::config::RenderConfig;
use crate::pipeline::Pipeline;
use crate::sanitize::sanitize;

/// A rendered bitmap and the key it was rendered for.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Layout width in pixels.
    pub width: f32,
    /// Sanitized source text.
    pub text: String,
    pub bitmap: RgbaImage,
}

impl Snapshot {
    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Encodes the bitmap as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder as _;
        use image::codecs::png::{CompressionType, FilterType, PngEncoder};

        let mut buf = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::Adaptive);
        let (w, h) = self.bitmap.dimensions();
        encoder
            .write_image(self.bitmap.as_raw(), w, h, image::ExtendedColorType::Rgba8)
            .context("Failed to encode snapshot as PNG")?;

        Ok(buf)
    }
}

/// Renders Markdown into cached bitmaps.
///
/// Safe to share between threads. Cache reads and writes are serialized;
/// rendering itself runs outside the lock, so two callers racing on
/// different keys both render and the later insert wins.
pub struct Rasterizer<B: TextBackend = GlyphBoxBackend> {
    pipeline: Pipeline,
    backend: B,
    line_spacing: f32,
    max_bitmap_pixels: u64,
    cache: Mutex<SnapshotCache>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Rasterizer {
    pub fn new(config: RenderConfig) -> Self {
        let backend = GlyphBoxBackend::new(config.snapshot.text_color);
        Self::with_backend(Pipeline::new(config), backend)
    }
}

impl<B: TextBackend> Rasterizer<B> {
    pub fn with_backend(pipeline: Pipeline, backend: B) -> Self {
        let snapshot = &pipeline.config().snapshot;
        let cache = SnapshotCache::new(snapshot.cache_capacity, snapshot.width_tolerance);
        Self {
            line_spacing: snapshot.line_spacing,
            max_bitmap_pixels: snapshot.max_bitmap_pixels,
            pipeline,
            backend,
            cache: Mutex::new(cache),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Renders `raw` at `width` pixels.
    ///
    /// Returns `None` for a non-positive or non-finite width, and when the
    /// bitmap would exceed `max_bitmap_pixels`. Repeated calls
    /// with the same text and a width inside the cache tolerance return the
    /// same snapshot.
    pub fn rasterize(&self, raw: &str, width: f32) -> Option<Arc<Snapshot>> {
        if !width.is_finite() || width <= 0.0 {
            tracing::debug!(width, "refusing to rasterize at non-positive width");
            return None;
        }

        let text = sanitize(raw);
        if let Some(hit) = self.cache().get(width, &text) {
            tracing::trace!(width, "snapshot cache hit");
            return Some(hit);
        }

        let mut doc = self.pipeline.styled_or_literal(&text, false);
        let rendered = doc.plain_text();
        if sanitize(&rendered) != rendered {
            // Character references can decode to scalars the input pass never saw.
            tracing::debug!("rendered text held disallowed scalars; re-sanitizing spans");
            doc = doc.sanitized();
        }

        let layout = layout_document(&doc, width, &self.backend, self.line_spacing);
        let pixel_width = width.ceil() as u32;
        let pixel_height = (layout.height.ceil() as u32).max(1);
        let pixels = u64::from(pixel_width) * u64::from(pixel_height);
        if pixels > self.max_bitmap_pixels {
            tracing::debug!(
                width = pixel_width,
                height = pixel_height,
                limit = self.max_bitmap_pixels,
                "snapshot bitmap over pixel limit"
            );
            return None;
        }
        let bitmap = self.backend.paint(&layout, pixel_width, pixel_height);

        tracing::debug!(
            width,
            height = pixel_height,
            lines = layout.lines.len(),
            "rasterized snapshot"
        );

        let snapshot = Arc::new(Snapshot {
            width,
            text,
            bitmap,
        });
        self.cache().insert(Arc::clone(&snapshot));
        Some(snapshot)
    }

    /// Drops every cached snapshot.
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, SnapshotCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
