//! Snapshot command handler.

use std::path::Path;

use anyhow::{Context, Result, bail};
use mdsnippet_core::{Rasterizer, RenderConfig};

use super::read_input;

pub fn run(config: &RenderConfig, input: &Path, width: f32, output: &Path) -> Result<()> {
    if !width.is_finite() || width <= 0.0 {
        bail!("width must be a positive number of pixels, got {width}");
    }

    let raw = read_input(input)?;
    let rasterizer = Rasterizer::new(config.clone());
    let Some(snapshot) = rasterizer.rasterize(&raw, width) else {
        bail!(
            "snapshot at width {width} exceeds {} pixels",
            config.snapshot.max_bitmap_pixels
        );
    };

    let png = snapshot.encode_png()?;
    std::fs::write(output, png).with_context(|| format!("write {}", output.display()))?;
    println!(
        "Wrote {}x{} snapshot to {}",
        snapshot.bitmap.width(),
        snapshot.height(),
        output.display()
    );
    Ok(())
}
