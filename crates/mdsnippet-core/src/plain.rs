//! Line-preserving plain-text projection.
//!
//! Each line is parsed on its own so the output keeps the source line
//! structure (no block re-flow). Lines that render to nothing, or that no
//! mode accepts, are kept verbatim.

use crate::markdown::{MarkdownParser, SyntaxMode};
use crate::sanitize::sanitize;

/// Characters shown in a document list row.
pub const LIST_PREVIEW_CHARS: usize = 140;
/// Characters shown as a search result subtitle.
pub const SEARCH_PREVIEW_CHARS: usize = 80;

/// Plain text of `raw`, one output line per input line.
pub fn plain_text(parser: &dyn MarkdownParser, raw: &str) -> String {
    let sanitized = sanitize(raw).replace("\r\n", "\n");

    sanitized
        .split('\n')
        .map(|line| project_line(parser, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn project_line(parser: &dyn MarkdownParser, line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }

    for mode in [SyntaxMode::Full, SyntaxMode::InlineOnly] {
        if let Ok(runs) = parser.parse_runs(line, mode) {
            // A lone `\r` still reads as a line ending to the parser.
            let rendered: String = runs
                .iter()
                .map(|r| if r.inline.is_break() { " " } else { r.text.as_str() })
                .collect();
            if rendered.is_empty() {
                return line.to_string();
            }
            return rendered;
        }
    }

    line.to_string()
}

/// First non-blank line of the plain text, trimmed.
pub fn title_line(parser: &dyn MarkdownParser, raw: &str) -> Option<String> {
    plain_text(parser, raw)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// The first `limit` characters of the plain text.
pub fn preview(parser: &dyn MarkdownParser, raw: &str, limit: usize) -> String {
    plain_text(parser, raw).chars().take(limit).collect()
}
