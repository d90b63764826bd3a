//! Run-to-style resolution.
//!
//! Maps [`SemanticRun`]s to [`StyledSpan`]s with concrete font descriptors,
//! inserting a blank-line separator wherever the source block changes.

use serde::Serialize;

use crate::markdown::{BlockId, InlineKind, SemanticRun};
use crate::sanitize::sanitize;

/// Text inserted between runs of different blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    System,
    Monospace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Semibold,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSlant {
    Upright,
    Italic,
}

/// Resolved font for a span. Built per span, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontDescriptor {
    pub family: FontFamily,
    pub weight: FontWeight,
    pub slant: FontSlant,
    /// Point size (base size times `scale`).
    pub size: f32,
    /// Scale applied to the base size.
    pub scale: f32,
}

impl FontDescriptor {
    /// Regular upright system font at `size`.
    pub fn body(size: f32) -> Self {
        Self {
            family: FontFamily::System,
            weight: FontWeight::Regular,
            slant: FontSlant::Upright,
            size,
            scale: 1.0,
        }
    }

    pub fn is_monospace(&self) -> bool {
        self.family == FontFamily::Monospace
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.slant == FontSlant::Italic
    }

    #[must_use]
    pub fn scaled(self, scale: f32) -> Self {
        Self {
            size: self.size * scale,
            scale: self.scale * scale,
            ..self
        }
    }

    #[must_use]
    pub fn with_weight(self, weight: FontWeight) -> Self {
        Self { weight, ..self }
    }

    #[must_use]
    pub fn with_slant(self, slant: FontSlant) -> Self {
        Self { slant, ..self }
    }

    #[must_use]
    pub fn monospaced(self) -> Self {
        Self {
            family: FontFamily::Monospace,
            ..self
        }
    }
}

/// Size multiplier for a heading level.
pub fn heading_scale(level: u8) -> f32 {
    match level {
        1 => 1.7,
        2 => 1.5,
        3 => 1.3,
        4 => 1.15,
        _ => 1.0,
    }
}

/// Font for a run, derived from the base size and the run's facts.
pub fn font_for_run(run: &SemanticRun, base_font_size: f32) -> FontDescriptor {
    let mut font = FontDescriptor::body(base_font_size);

    if let Some(level) = run.heading_level() {
        font = font
            .scaled(heading_scale(level))
            .with_weight(FontWeight::Semibold);
    }

    if run.inline.contains(InlineKind::CODE) {
        font = font.monospaced();
    }
    if run.inline.contains(InlineKind::EMPHASIS) {
        font = font.with_slant(FontSlant::Italic);
    }
    if run.inline.contains(InlineKind::STRONG) {
        font = font.with_weight(FontWeight::Bold);
    }

    font
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanRole {
    Content,
    BlockSeparator,
}

/// Render-ready piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledSpan {
    pub text: String,
    pub font: FontDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    pub role: SpanRole,
}

impl StyledSpan {
    pub fn plain(text: impl Into<String>, font: FontDescriptor) -> Self {
        Self {
            text: text.into(),
            font,
            link: None,
            strikethrough: false,
            role: SpanRole::Content,
        }
    }

    fn separator(base_font_size: f32) -> Self {
        Self {
            role: SpanRole::BlockSeparator,
            ..Self::plain(BLOCK_SEPARATOR, FontDescriptor::body(base_font_size))
        }
    }

    pub fn is_separator(&self) -> bool {
        self.role == SpanRole::BlockSeparator
    }
}

/// Ordered spans plus block separators.
///
/// Never starts or ends with a separator and never holds two in a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StyledDocument {
    spans: Vec<StyledSpan>,
}

impl StyledDocument {
    /// A document showing `text` verbatim in the body font.
    pub fn literal(text: &str, base_font_size: f32) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            spans: vec![StyledSpan::plain(text, FontDescriptor::body(base_font_size))],
        }
    }

    pub fn spans(&self) -> &[StyledSpan] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Concatenated text of every span, separators included.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Copy with disallowed scalars removed from every span.
    ///
    /// Spans left empty are dropped and separators re-checked, so the
    /// separator invariants still hold.
    #[must_use]
    pub fn sanitized(&self) -> StyledDocument {
        let mut spans: Vec<StyledSpan> = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            if span.is_separator() {
                if spans.last().is_some_and(|s| !s.is_separator()) {
                    spans.push(span.clone());
                }
                continue;
            }
            let text = sanitize(&span.text);
            if !text.is_empty() {
                spans.push(StyledSpan { text, ..span.clone() });
            }
        }
        if spans.last().is_some_and(StyledSpan::is_separator) {
            spans.pop();
        }
        StyledDocument { spans }
    }

    fn push_separator(&mut self, base_font_size: f32) {
        if self.spans.last().is_some_and(|s| !s.is_separator()) {
            self.spans.push(StyledSpan::separator(base_font_size));
        }
    }
}

/// Resolves runs into a styled document.
///
/// Deterministic: equal inputs give equal documents. Every non-empty run
/// contributes its text; break runs become a single newline.
pub fn resolve(runs: &[SemanticRun], base_font_size: f32, include_links: bool) -> StyledDocument {
    let mut doc = StyledDocument::default();
    let mut previous_block: Option<BlockId> = None;
    let mut boundary_pending = false;

    for run in runs {
        let block = run.block_id();
        if let (Some(previous), Some(current)) = (previous_block, block)
            && previous != current
        {
            boundary_pending = true;
        }
        previous_block = block.or(previous_block);

        let text = if run.inline.is_break() {
            "\n"
        } else {
            run.text.as_str()
        };
        if text.is_empty() {
            continue;
        }

        if std::mem::take(&mut boundary_pending) {
            doc.push_separator(base_font_size);
        }

        doc.spans.push(StyledSpan {
            text: text.to_string(),
            font: font_for_run(run, base_font_size),
            link: if include_links { run.link.clone() } else { None },
            strikethrough: run.inline.contains(InlineKind::STRIKETHROUGH),
            role: SpanRole::Content,
        });
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{BlockIntent, BlockKind};

    fn run(text: &str, block: u32, inline: InlineKind) -> SemanticRun {
        SemanticRun {
            text: text.to_string(),
            block: Some(BlockIntent {
                id: BlockId(block),
                kind: BlockKind::Paragraph,
            }),
            inline,
            link: None,
        }
    }

    fn heading(text: &str, block: u32, level: u8) -> SemanticRun {
        SemanticRun {
            block: Some(BlockIntent {
                id: BlockId(block),
                kind: BlockKind::Heading { level },
            }),
            ..run(text, block, InlineKind::empty())
        }
    }

    fn separators(doc: &StyledDocument) -> usize {
        doc.spans().iter().filter(|s| s.is_separator()).count()
    }

    #[test]
    fn test_separator_between_blocks() {
        let runs = vec![
            run("a", 0, InlineKind::empty()),
            run("b", 1, InlineKind::empty()),
        ];
        let doc = resolve(&runs, 10.0, true);
        assert_eq!(doc.plain_text(), "a\n\nb");
        assert_eq!(separators(&doc), 1);
        assert!(doc.spans()[1].is_separator());
    }

    #[test]
    fn test_no_separator_within_block() {
        let runs = vec![
            run("a", 0, InlineKind::empty()),
            run("b", 0, InlineKind::STRONG),
        ];
        let doc = resolve(&runs, 10.0, true);
        assert_eq!(doc.plain_text(), "ab");
        assert_eq!(separators(&doc), 0);
    }

    #[test]
    fn test_break_runs_become_newline() {
        let runs = vec![
            run("a", 0, InlineKind::empty()),
            run(" ", 0, InlineKind::SOFT_BREAK),
            run("b", 0, InlineKind::empty()),
            run("", 0, InlineKind::LINE_BREAK),
            run("c", 0, InlineKind::empty()),
        ];
        assert_eq!(resolve(&runs, 10.0, true).plain_text(), "a\nb\nc");
    }

    #[test]
    fn test_empty_runs_still_track_block_identity() {
        let runs = vec![
            run("a", 0, InlineKind::empty()),
            run("", 1, InlineKind::empty()),
            run("b", 1, InlineKind::empty()),
            run("", 2, InlineKind::empty()),
            run("", 3, InlineKind::empty()),
            run("c", 4, InlineKind::empty()),
        ];
        let doc = resolve(&runs, 10.0, true);
        assert_eq!(doc.plain_text(), "a\n\nb\n\nc");
        assert_eq!(separators(&doc), 2);
    }

    #[test]
    fn test_never_starts_with_separator() {
        let runs = vec![
            run("", 0, InlineKind::empty()),
            run("b", 1, InlineKind::empty()),
        ];
        let doc = resolve(&runs, 10.0, true);
        assert_eq!(doc.plain_text(), "b");
    }

    #[test]
    fn test_runs_without_block_do_not_split() {
        let mut loose = run("b", 0, InlineKind::empty());
        loose.block = None;
        let runs = vec![run("a", 0, InlineKind::empty()), loose, run("c", 0, InlineKind::empty())];
        assert_eq!(resolve(&runs, 10.0, true).plain_text(), "abc");
    }

    #[test]
    fn test_style_composition_italic_and_bold() {
        let runs = vec![run("x", 0, InlineKind::EMPHASIS | InlineKind::STRONG)];
        let doc = resolve(&runs, 10.0, true);
        let font = doc.spans()[0].font;
        assert!(font.is_italic());
        assert!(font.is_bold());
        assert!(!font.is_monospace());
    }

    #[test]
    fn test_code_span_is_monospace_same_size() {
        let runs = vec![run("x", 0, InlineKind::CODE)];
        let font = resolve(&runs, 12.0, true).spans()[0].font;
        assert!(font.is_monospace());
        assert!((font.size - 12.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_heading_scale_monotonic() {
        let sizes: Vec<f32> = (1..=6)
            .map(|level| font_for_run(&heading("h", 0, level), 10.0).size)
            .collect();
        assert!(sizes[0] > sizes[1]);
        assert!(sizes[1] > sizes[2]);
        assert!(sizes[2] > sizes[3]);
        assert!((sizes[4] - 10.0).abs() < 1e-4);
        assert!((sizes[5] - 10.0).abs() < 1e-4);
        assert!((sizes[0] - 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_heading_is_semibold_and_strong_heading_is_bold() {
        let font = font_for_run(&heading("h", 0, 2), 10.0);
        assert_eq!(font.weight, FontWeight::Semibold);

        let mut strong = heading("h", 0, 2);
        strong.inline = InlineKind::STRONG;
        assert_eq!(font_for_run(&strong, 10.0).weight, FontWeight::Bold);
    }

    #[test]
    fn test_links_only_when_requested() {
        let mut linked = run("site", 0, InlineKind::empty());
        linked.link = Some("https://example.com".to_string());
        let runs = vec![linked];

        let with = resolve(&runs, 10.0, true);
        assert_eq!(with.spans()[0].link.as_deref(), Some("https://example.com"));

        let without = resolve(&runs, 10.0, false);
        assert!(without.spans()[0].link.is_none());
    }

    #[test]
    fn test_empty_runs_give_empty_document() {
        assert!(resolve(&[], 10.0, true).is_empty());
    }

    #[test]
    fn test_resolution_is_stable() {
        let runs = vec![
            heading("Title", 0, 1),
            run("body ", 1, InlineKind::empty()),
            run("code", 1, InlineKind::CODE),
        ];
        assert_eq!(resolve(&runs, 15.0, true), resolve(&runs, 15.0, true));
    }

    #[test]
    fn test_sanitized_drops_emptied_spans_and_extra_separators() {
        let runs = vec![
            run("a", 0, InlineKind::empty()),
            run("\u{200B}", 1, InlineKind::empty()),
            run("b\u{200D}", 2, InlineKind::STRONG),
            run("\u{FEFF}", 3, InlineKind::empty()),
        ];
        let doc = resolve(&runs, 10.0, true);
        assert_eq!(separators(&doc), 3);

        let clean = doc.sanitized();
        assert_eq!(clean.plain_text(), "a\n\nb");
        assert_eq!(separators(&clean), 1);
        assert!(clean.spans()[2].font.is_bold());
    }

    #[test]
    fn test_strikethrough_carried_to_span() {
        let runs = vec![run("gone", 0, InlineKind::STRIKETHROUGH)];
        assert!(resolve(&runs, 10.0, true).spans()[0].strikethrough);
    }

    #[test]
    fn test_document_serializes_as_span_array() {
        let mut linked = run("docs", 1, InlineKind::EMPHASIS);
        linked.link = Some("https://example.com".to_string());
        let doc = resolve(&[heading("Title", 0, 2), linked], 10.0, true);

        let json = serde_json::to_value(&doc).unwrap();
        let spans = json.as_array().unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0]["font"]["weight"], "semibold");
        assert_eq!(spans[1]["role"], "block_separator");
        assert_eq!(spans[2]["font"]["slant"], "italic");
        assert_eq!(spans[2]["link"], "https://example.com");
        assert!(spans[0].get("link").is_none());
        assert!(spans[0].get("strikethrough").is_none());
    }
}
