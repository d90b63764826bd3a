//! Word-wrapping layout of a styled document at a fixed width.
//!
//! Hard newlines always break. Proportional text breaks at whitespace and
//! drops the whitespace it broke at; monospace (code) text keeps its
//! whitespace and moves to a fresh line as a whole when it fits there.
//! Anything wider than the line is broken glyph by glyph.

use super::backend::{FontMetrics, TextBackend};
use crate::style::{FontDescriptor, StyledDocument, StyledSpan};

/// A piece of one span placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedRun {
    pub text: String,
    pub font: FontDescriptor,
    pub x: f32,
    pub width: f32,
    pub strikethrough: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub runs: Vec<PositionedRun>,
    pub top: f32,
    pub baseline: f32,
    pub height: f32,
    /// Advance of the placed content.
    pub width: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LayoutLine>,
    /// Width the document was wrapped to.
    pub width: f32,
    /// Sum of all line heights.
    pub height: f32,
}

/// Lays out `doc` at `width` pixels.
pub fn layout_document(
    doc: &StyledDocument,
    width: f32,
    backend: &dyn TextBackend,
    line_spacing: f32,
) -> TextLayout {
    let mut builder = LineBuilder::new(backend, width, line_spacing);

    for span in doc.spans() {
        builder.note_font(span.font);
        for (i, part) in span.text.split('\n').enumerate() {
            if i > 0 {
                builder.flush(false);
                builder.note_font(span.font);
            }
            if part.is_empty() {
                continue;
            }
            if span.font.is_monospace() {
                builder.place_code(part, span);
            } else {
                builder.place_text(part, span);
            }
        }
    }

    builder.finish()
}

struct LineBuilder<'a> {
    backend: &'a dyn TextBackend,
    max_width: f32,
    line_spacing: f32,
    lines: Vec<LayoutLine>,
    runs: Vec<PositionedRun>,
    x: f32,
    top: f32,
    /// Tallest font seen on the current line; sizes lines with no runs.
    line_font: Option<FontDescriptor>,
    /// Current line was opened by wrapping rather than by a newline.
    soft_wrapped: bool,
    /// Current line was opened by a newline and must be kept even if empty.
    after_hard_break: bool,
}

impl<'a> LineBuilder<'a> {
    fn new(backend: &'a dyn TextBackend, max_width: f32, line_spacing: f32) -> Self {
        Self {
            backend,
            max_width,
            line_spacing,
            lines: Vec::new(),
            runs: Vec::new(),
            x: 0.0,
            top: 0.0,
            line_font: None,
            soft_wrapped: false,
            after_hard_break: false,
        }
    }

    fn note_font(&mut self, font: FontDescriptor) {
        match self.line_font {
            Some(current) if current.size >= font.size => {}
            _ => self.line_font = Some(font),
        }
    }

    fn place(&mut self, text: &str, width: f32, span: &StyledSpan) {
        if let Some(last) = self.runs.last_mut()
            && last.font == span.font
            && last.strikethrough == span.strikethrough
        {
            last.text.push_str(text);
            last.width += width;
        } else {
            self.runs.push(PositionedRun {
                text: text.to_string(),
                font: span.font,
                x: self.x,
                width,
                strikethrough: span.strikethrough,
            });
        }
        self.x += width;
    }

    fn line_metrics(&self) -> FontMetrics {
        let from_runs = self.runs.iter().map(|r| self.backend.metrics(&r.font)).reduce(|a, b| {
            FontMetrics {
                ascent: a.ascent.max(b.ascent),
                descent: a.descent.max(b.descent),
            }
        });
        from_runs
            .or_else(|| self.line_font.map(|f| self.backend.metrics(&f)))
            .unwrap_or(FontMetrics {
                ascent: 0.0,
                descent: 0.0,
            })
    }

    fn flush(&mut self, soft: bool) {
        if soft {
            self.trim_trailing_space();
        }
        let metrics = self.line_metrics();
        let content = metrics.height();
        let height = content * self.line_spacing;
        let baseline = self.top + (height - content) / 2.0 + metrics.ascent;

        self.lines.push(LayoutLine {
            runs: std::mem::take(&mut self.runs),
            top: self.top,
            baseline,
            height,
            width: self.x,
        });

        self.top += height;
        self.x = 0.0;
        self.line_font = None;
        self.soft_wrapped = soft;
        self.after_hard_break = !soft;
    }

    /// Drops whitespace left at the end of a wrapped proportional line.
    fn trim_trailing_space(&mut self) {
        let Some(last) = self.runs.last_mut() else {
            return;
        };
        if last.font.is_monospace() {
            return;
        }
        let kept = last.text.trim_end().len();
        if kept == last.text.len() {
            return;
        }
        let trimmed = self.backend.text_width(&last.text[kept..], &last.font);
        last.text.truncate(kept);
        last.width -= trimmed;
        self.x -= trimmed;
        if last.text.is_empty() {
            self.runs.pop();
        }
    }

    fn place_text(&mut self, part: &str, span: &StyledSpan) {
        for token in segments(part) {
            let width = self.backend.text_width(token, &span.font);
            let is_space = token.starts_with(char::is_whitespace);

            if is_space {
                if self.x <= 0.0 && self.soft_wrapped {
                    continue;
                }
                if self.x + width > self.max_width {
                    self.flush(true);
                    self.note_font(span.font);
                    continue;
                }
                self.place(token, width, span);
            } else if self.x + width <= self.max_width {
                self.place(token, width, span);
            } else if self.x > 0.0 && width <= self.max_width {
                self.flush(true);
                self.note_font(span.font);
                self.place(token, width, span);
            } else {
                if self.x > 0.0 {
                    self.flush(true);
                    self.note_font(span.font);
                }
                self.place_by_glyph(token, span);
            }
        }
    }

    fn place_code(&mut self, part: &str, span: &StyledSpan) {
        let width = self.backend.text_width(part, &span.font);
        if self.x + width <= self.max_width {
            self.place(part, width, span);
        } else if self.x > 0.0 && width <= self.max_width {
            self.flush(true);
            self.note_font(span.font);
            self.place(part, width, span);
        } else {
            self.place_by_glyph(part, span);
        }
    }

    /// Fills lines glyph by glyph; every line gets at least one glyph.
    fn place_by_glyph(&mut self, text: &str, span: &StyledSpan) {
        let mut piece = String::new();
        let mut piece_width = 0.0;

        for ch in text.chars() {
            let advance = self.backend.advance(ch, &span.font);
            let line_empty = piece.is_empty() && self.x <= 0.0;
            if self.x + piece_width + advance > self.max_width && !line_empty {
                if !piece.is_empty() {
                    self.place(&piece, piece_width, span);
                    piece.clear();
                    piece_width = 0.0;
                }
                self.flush(true);
                self.note_font(span.font);
            }
            piece.push(ch);
            piece_width += advance;
        }

        if !piece.is_empty() {
            self.place(&piece, piece_width, span);
        }
    }

    fn finish(mut self) -> TextLayout {
        if !self.runs.is_empty() || self.after_hard_break {
            self.flush(false);
        }
        TextLayout {
            lines: self.lines,
            width: self.max_width,
            height: self.top,
        }
    }
}

/// Splits `text` into alternating runs of whitespace and non-whitespace.
fn segments(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|&(_, ch)| ch.is_whitespace() != space)
            .map_or(rest.len(), |(i, _)| i);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::backend::GlyphBoxBackend;
    use crate::markdown::{InlineKind, SemanticRun};
    use crate::style::{StyledDocument, resolve};

    fn line_texts(layout: &TextLayout) -> Vec<String> {
        layout
            .lines
            .iter()
            .map(|l| l.runs.iter().map(|r| r.text.as_str()).collect())
            .collect()
    }

    fn mono_doc(text: &str) -> StyledDocument {
        let run = SemanticRun {
            text: text.to_string(),
            block: None,
            inline: InlineKind::CODE,
            link: None,
        };
        resolve(&[run], 10.0, false)
    }

    #[test]
    fn test_segments_alternate() {
        let parts: Vec<_> = segments("  ab  c").collect();
        assert_eq!(parts, vec!["  ", "ab", "  ", "c"]);
        assert_eq!(segments("").count(), 0);
    }

    #[test]
    fn test_single_line_fits() {
        let backend = GlyphBoxBackend::default();
        let doc = StyledDocument::literal("hello world", 10.0);
        let layout = layout_document(&doc, 1000.0, &backend, 1.0);
        assert_eq!(line_texts(&layout), vec!["hello world"]);
        assert!((layout.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_wraps_at_whitespace_and_drops_break_space() {
        let backend = GlyphBoxBackend::default();
        let doc = StyledDocument::literal("hello world", 10.0);
        // "hello" is 5 * 5.2 = 26px; the line cannot also hold " world".
        let layout = layout_document(&doc, 30.0, &backend, 1.0);
        assert_eq!(line_texts(&layout), vec!["hello", "world"]);
    }

    #[test]
    fn test_hard_breaks_and_blank_lines() {
        let backend = GlyphBoxBackend::default();
        let doc = StyledDocument::literal("a\n\nb", 10.0);
        let layout = layout_document(&doc, 1000.0, &backend, 1.0);
        assert_eq!(line_texts(&layout), vec!["a", "", "b"]);
        assert!((layout.height - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_long_word_breaks_by_glyph() {
        let backend = GlyphBoxBackend::default();
        // Monospace columns are 6px wide: three glyphs per 20px line.
        let layout = layout_document(&mono_doc("abcdefgh"), 20.0, &backend, 1.0);
        assert_eq!(line_texts(&layout), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_code_keeps_whitespace() {
        let backend = GlyphBoxBackend::default();
        let layout = layout_document(&mono_doc("a  b"), 1000.0, &backend, 1.0);
        assert_eq!(line_texts(&layout), vec!["a  b"]);
    }

    #[test]
    fn test_narrower_width_is_taller() {
        let backend = GlyphBoxBackend::default();
        let doc = StyledDocument::literal("the quick brown fox jumps over the lazy dog", 10.0);
        let wide = layout_document(&doc, 1000.0, &backend, 1.2);
        let narrow = layout_document(&doc, 60.0, &backend, 1.2);
        assert!(narrow.height > wide.height);
        assert!(narrow.lines.iter().all(|l| l.width <= 60.0 + 1e-3));
    }

    #[test]
    fn test_empty_document_has_no_lines() {
        let backend = GlyphBoxBackend::default();
        let layout = layout_document(&StyledDocument::default(), 100.0, &backend, 1.2);
        assert!(layout.lines.is_empty());
        assert!(layout.height.abs() < f32::EPSILON);
    }
}
