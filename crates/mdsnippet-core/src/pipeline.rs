//! Composed pipeline: sanitize, parse, resolve.

use std::sync::Arc;

use crate::config::RenderConfig;
use crate::markdown::{self, CmarkParser, MarkdownParser, SemanticRun};
use crate::plain;
use crate::sanitize::sanitize;
use crate::style::{StyledDocument, resolve};

/// The Markdown pipeline bound to a parser and configuration.
///
/// Cheap to clone; every call owns its intermediate values, so one instance
/// can serve many threads.
#[derive(Clone)]
pub struct Pipeline {
    parser: Arc<dyn MarkdownParser>,
    config: RenderConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline using the built-in pulldown-cmark parser.
    pub fn new(config: RenderConfig) -> Self {
        let parser = CmarkParser::new(config.parse);
        Self::with_parser(Arc::new(parser), config)
    }

    /// Pipeline using a caller-supplied parser.
    pub fn with_parser(parser: Arc<dyn MarkdownParser>, config: RenderConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn parser(&self) -> &dyn MarkdownParser {
        self.parser.as_ref()
    }

    /// Sanitizes then parses `raw` with the two-tier fallback.
    pub fn parse(&self, raw: &str) -> Option<Vec<SemanticRun>> {
        markdown::parse(self.parser(), &sanitize(raw))
    }

    /// Styled document for `raw`, or `None` when no parse mode accepts it
    /// (the caller then shows the sanitized text verbatim).
    pub fn styled_document(
        &self,
        raw: &str,
        base_font_size: f32,
        include_links: bool,
    ) -> Option<StyledDocument> {
        let runs = self.parse(raw)?;
        Some(resolve(&runs, base_font_size, include_links))
    }

    /// Like [`Pipeline::styled_document`] but falls back to the sanitized
    /// text in the body font.
    pub fn styled_or_literal(&self, raw: &str, include_links: bool) -> StyledDocument {
        let base = self.config.base_font_size;
        let sanitized = sanitize(raw);
        match markdown::parse(self.parser(), &sanitized) {
            Some(runs) => resolve(&runs, base, include_links),
            None => StyledDocument::literal(&sanitized, base),
        }
    }

    pub fn plain_text(&self, raw: &str) -> String {
        plain::plain_text(self.parser(), raw)
    }

    pub fn title_line(&self, raw: &str) -> Option<String> {
        plain::title_line(self.parser(), raw)
    }

    pub fn preview(&self, raw: &str, limit: usize) -> String {
        plain::preview(self.parser(), raw, limit)
    }
}
