//! Markdown snippet rendering: sanitize, parse, style, project and rasterize
//! untrusted Markdown notes.
//!
//! The free functions use the default [`Pipeline`]. Build a [`Pipeline`] or a
//! [`Rasterizer`] from a [`RenderConfig`] to change limits or fonts; a
//! rasterizer owns its snapshot cache.

pub mod config;
pub mod markdown;
pub mod pipeline;
pub mod plain;
pub mod sanitize;
pub mod snapshot;
pub mod style;

pub use config::{RenderConfig, SnapshotConfig};
pub use markdown::{CmarkParser, MarkdownParser, ParseLimits, SemanticRun, SyntaxMode};
pub use pipeline::Pipeline;
pub use sanitize::{SanitizeReport, describe, sanitize};
pub use snapshot::{Rasterizer, Snapshot};
pub use style::{FontDescriptor, StyledDocument, StyledSpan};

/// Styled document for `raw` with the default parser, or `None` when no
/// parse mode accepts it.
pub fn styled_document(
    raw: &str,
    base_font_size: f32,
    include_links: bool,
) -> Option<StyledDocument> {
    Pipeline::default().styled_document(raw, base_font_size, include_links)
}

/// Line-preserving plain text of `raw` with the default parser.
pub fn plain_text(raw: &str) -> String {
    Pipeline::default().plain_text(raw)
}
