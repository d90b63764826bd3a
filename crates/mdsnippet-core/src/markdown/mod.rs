//! Markdown parsing into semantic runs.
//!
//! A [`MarkdownParser`] turns sanitized text into an ordered list of
//! [`SemanticRun`]s. [`parse`] applies the two-tier policy: full syntax
//! first, then inline-only, then `None` (caller shows the text verbatim).

mod cmark;

use bitflags::bitflags;
use serde::Serialize;

pub use cmark::{CmarkParser, ParseLimits};

/// Which Markdown constructs a parse interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxMode {
    /// Block and inline constructs.
    Full,
    /// Inline constructs only; whitespace and line structure are kept.
    InlineOnly,
}

impl SyntaxMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxMode::Full => "full",
            SyntaxMode::InlineOnly => "inline-only",
        }
    }
}

/// Opaque marker grouping runs that belong to the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId(pub u32);

/// Structural block a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    CodeBlock { language: Option<String> },
    TableCell { column: usize },
    ListItem { ordinal: Option<u64> },
    BlockQuote,
}

/// Innermost block of a run plus its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockIntent {
    pub id: BlockId,
    pub kind: BlockKind,
}

bitflags! {
    /// Inline presentation facts of a run. Flags compose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    #[serde(transparent)]
    pub struct InlineKind: u8 {
        const EMPHASIS = 1;
        const STRONG = 1 << 1;
        const CODE = 1 << 2;
        const SOFT_BREAK = 1 << 3;
        const LINE_BREAK = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
    }
}

impl InlineKind {
    /// True for runs that stand for an author-entered newline.
    pub fn is_break(self) -> bool {
        self.intersects(InlineKind::SOFT_BREAK | InlineKind::LINE_BREAK)
    }
}

/// A parser-produced span of text with its Markdown structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticRun {
    pub text: String,
    pub block: Option<BlockIntent>,
    pub inline: InlineKind,
    pub link: Option<String>,
}

impl SemanticRun {
    pub fn block_id(&self) -> Option<BlockId> {
        self.block.as_ref().map(|b| b.id)
    }

    /// Heading level of the run's block, if it is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self.block.as_ref().map(|b| &b.kind) {
            Some(BlockKind::Heading { level }) => Some(*level),
            _ => None,
        }
    }
}

/// A Markdown parser that can be plugged into the pipeline.
///
/// Implementations report malformed or rejected input as an error; they must
/// not panic on any input.
pub trait MarkdownParser: Send + Sync {
    /// Parses `text` under the given syntax mode.
    ///
    /// # Errors
    /// Returns an error when the parser rejects the input in this mode.
    fn parse_runs(&self, text: &str, mode: SyntaxMode) -> anyhow::Result<Vec<SemanticRun>>;
}

/// Parses with full syntax, falling back to inline-only, then to `None`.
///
/// Never fails: a `None` result means "render the text verbatim".
pub fn parse(parser: &dyn MarkdownParser, text: &str) -> Option<Vec<SemanticRun>> {
    for mode in [SyntaxMode::Full, SyntaxMode::InlineOnly] {
        match parser.parse_runs(text, mode) {
            Ok(runs) => return Some(runs),
            Err(err) => {
                tracing::debug!(mode = mode.as_str(), error = %err, len = text.len(), "markdown parse rejected");
            }
        }
    }

    tracing::debug!(len = text.len(), "markdown parse failed in every mode, using literal text");
    None
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{MarkdownParser, SemanticRun, SyntaxMode};

    /// Parser double that answers per mode and records the modes it saw.
    pub(crate) struct ScriptedParser {
        pub full: Option<Vec<SemanticRun>>,
        pub inline: Option<Vec<SemanticRun>>,
        pub calls: Mutex<Vec<SyntaxMode>>,
    }

    impl ScriptedParser {
        pub(crate) fn new(full: Option<Vec<SemanticRun>>, inline: Option<Vec<SemanticRun>>) -> Self {
            Self {
                full,
                inline,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl MarkdownParser for ScriptedParser {
        fn parse_runs(&self, _text: &str, mode: SyntaxMode) -> anyhow::Result<Vec<SemanticRun>> {
            self.calls.lock().unwrap().push(mode);
            let answer = match mode {
                SyntaxMode::Full => &self.full,
                SyntaxMode::InlineOnly => &self.inline,
            };
            answer
                .clone()
                .ok_or_else(|| anyhow::anyhow!("scripted rejection"))
        }
    }
}
