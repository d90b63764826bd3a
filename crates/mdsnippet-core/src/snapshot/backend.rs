//! Text measurement and painting backends.
//!
//! [`TextBackend`] is the seam to a real font stack: it selects a font for a
//! descriptor, reports glyph advances and paints a laid-out document into an
//! RGBA buffer. [`GlyphBoxBackend`] is a dependency-free implementation that
//! derives proportional metrics from `unicode-width` and paints every
//! visible glyph as a filled box.

use image::{Rgba, RgbaImage};
use unicode_width::UnicodeWidthChar;

use super::layout::TextLayout;
use crate::style::{FontDescriptor, FontWeight};

/// Vertical metrics of a selected font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl FontMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

pub trait TextBackend: Send + Sync {
    /// Selects the font for `font` and returns its vertical metrics.
    fn metrics(&self, font: &FontDescriptor) -> FontMetrics;

    /// Horizontal advance of `ch` in `font`.
    fn advance(&self, ch: char, font: &FontDescriptor) -> f32;

    /// Paints `layout` into a transparent `width` x `height` buffer.
    fn paint(&self, layout: &TextLayout, width: u32, height: u32) -> RgbaImage;

    /// Advance of a whole string.
    fn text_width(&self, text: &str, font: &FontDescriptor) -> f32 {
        text.chars().map(|ch| self.advance(ch, font)).sum()
    }
}

/// Em fraction of one terminal column for proportional text.
const PROPORTIONAL_EM: f32 = 0.52;
const MONOSPACE_EM: f32 = 0.6;
const SPACE_EM: f32 = 0.28;
const TAB_SPACES: f32 = 4.0;

/// Metric-only backend that draws glyph boxes.
#[derive(Debug, Clone)]
pub struct GlyphBoxBackend {
    color: [u8; 4],
}

impl Default for GlyphBoxBackend {
    fn default() -> Self {
        Self::new([0, 0, 0, 255])
    }
}

impl GlyphBoxBackend {
    pub fn new(color: [u8; 4]) -> Self {
        Self { color }
    }

    fn column_advance(font: &FontDescriptor) -> f32 {
        if font.is_monospace() {
            return font.size * MONOSPACE_EM;
        }
        let boost = match font.weight {
            FontWeight::Regular => 0.0,
            FontWeight::Semibold => 0.02,
            FontWeight::Bold => 0.04,
        };
        font.size * (PROPORTIONAL_EM + boost)
    }

    fn ink(&self, font: &FontDescriptor) -> Rgba<u8> {
        let [r, g, b, a] = self.color;
        let coverage = match font.weight {
            FontWeight::Regular => 0.75,
            FontWeight::Semibold => 0.88,
            FontWeight::Bold => 1.0,
        };
        Rgba([r, g, b, (f32::from(a) * coverage).round() as u8])
    }
}

impl TextBackend for GlyphBoxBackend {
    fn metrics(&self, font: &FontDescriptor) -> FontMetrics {
        FontMetrics {
            ascent: font.size * 0.8,
            descent: font.size * 0.2,
        }
    }

    fn advance(&self, ch: char, font: &FontDescriptor) -> f32 {
        let column = Self::column_advance(font);
        match ch {
            '\t' => column * TAB_SPACES,
            ' ' if !font.is_monospace() => font.size * SPACE_EM,
            _ => ch.width().map_or(0.0, |w| w as f32 * column),
        }
    }

    fn paint(&self, layout: &TextLayout, width: u32, height: u32) -> RgbaImage {
        let mut image = RgbaImage::new(width, height);

        for line in &layout.lines {
            for run in &line.runs {
                let metrics = self.metrics(&run.font);
                let ink = self.ink(&run.font);
                let mut x = run.x;

                for ch in run.text.chars() {
                    let advance = self.advance(ch, &run.font);
                    if !ch.is_whitespace() && advance > 0.0 {
                        let glyph_height = if ch.is_lowercase() {
                            metrics.ascent * 0.62
                        } else {
                            metrics.ascent * 0.9
                        };
                        let slant = if run.font.is_italic() { 0.2 } else { 0.0 };
                        fill_glyph(
                            &mut image,
                            GlyphBox {
                                left: x + advance * 0.12,
                                right: x + advance * 0.88,
                                top: line.baseline - glyph_height,
                                bottom: line.baseline,
                                slant,
                            },
                            ink,
                        );
                    }
                    x += advance;
                }

                if run.strikethrough {
                    let thickness = (run.font.size / 14.0).max(1.0);
                    let y = line.baseline - metrics.ascent * 0.3;
                    fill_glyph(
                        &mut image,
                        GlyphBox {
                            left: run.x,
                            right: run.x + run.width,
                            top: y - thickness / 2.0,
                            bottom: y + thickness / 2.0,
                            slant: 0.0,
                        },
                        ink,
                    );
                }
            }
        }

        image
    }
}

/// Axis-aligned box, optionally sheared to the right as it rises.
struct GlyphBox {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    slant: f32,
}

fn fill_glyph(image: &mut RgbaImage, glyph: GlyphBox, ink: Rgba<u8>) {
    let (width, height) = image.dimensions();
    let top = glyph.top.max(0.0).floor() as u32;
    let bottom = (glyph.bottom.ceil().max(0.0) as u32).min(height);

    for y in top..bottom {
        let rise = glyph.bottom - y as f32;
        let shift = rise * glyph.slant;
        let left = (glyph.left + shift).max(0.0).floor() as u32;
        let right = ((glyph.right + shift).ceil().max(0.0) as u32).min(width);
        for x in left..right {
            image.put_pixel(x, y, ink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monospace_advance_uniform() {
        let backend = GlyphBoxBackend::default();
        let mono = FontDescriptor::body(10.0).monospaced();
        assert!((backend.advance('i', &mono) - backend.advance('W', &mono)).abs() < f32::EPSILON);
        assert!((backend.advance(' ', &mono) - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_wide_and_zero_width_advances() {
        let backend = GlyphBoxBackend::default();
        let body = FontDescriptor::body(10.0);
        let narrow = backend.advance('a', &body);
        assert!((backend.advance('日', &body) - narrow * 2.0).abs() < 1e-4);
        assert!(backend.advance('\u{0301}', &body).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let backend = GlyphBoxBackend::default();
        let regular = FontDescriptor::body(10.0);
        let bold = regular.with_weight(FontWeight::Bold);
        assert!(backend.text_width("bold", &bold) > backend.text_width("bold", &regular));
    }

    #[test]
    fn test_fill_glyph_clips_to_image() {
        let mut image = RgbaImage::new(4, 4);
        fill_glyph(
            &mut image,
            GlyphBox {
                left: -3.0,
                right: 10.0,
                top: -2.0,
                bottom: 2.0,
                slant: 0.0,
            },
            Rgba([1, 2, 3, 4]),
        );
        assert_eq!(*image.get_pixel(3, 1), Rgba([1, 2, 3, 4]));
        assert_eq!(*image.get_pixel(0, 2), Rgba([0, 0, 0, 0]));
    }
}
