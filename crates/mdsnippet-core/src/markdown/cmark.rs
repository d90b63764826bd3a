//! pulldown-cmark backed [`MarkdownParser`].
//!
//! Full mode walks the event stream with a block stack so every run knows
//! its innermost block. Inline-only mode parses each line on its own after
//! escaping anything that would open a block, and keeps line structure and
//! surrounding whitespace verbatim.

use anyhow::bail;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use super::{BlockId, BlockIntent, BlockKind, InlineKind, MarkdownParser, SemanticRun, SyntaxMode};

/// Input the parser refuses instead of interpreting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Larger inputs are rejected in every mode.
    pub max_input_bytes: usize,
    /// Deepest block nesting (full mode) or inline nesting (both modes).
    pub max_nesting_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 1024 * 1024,
            max_nesting_depth: 32,
        }
    }
}

/// CommonMark parser adapter built on pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct CmarkParser {
    limits: ParseLimits,
}

impl CmarkParser {
    pub fn new(limits: ParseLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ParseLimits {
        self.limits
    }
}

impl MarkdownParser for CmarkParser {
    fn parse_runs(&self, text: &str, mode: SyntaxMode) -> anyhow::Result<Vec<SemanticRun>> {
        if text.len() > self.limits.max_input_bytes {
            bail!(
                "input is {} bytes, limit is {}",
                text.len(),
                self.limits.max_input_bytes
            );
        }

        match mode {
            SyntaxMode::Full => parse_full(text, self.limits.max_nesting_depth),
            SyntaxMode::InlineOnly => parse_inline_only(text, self.limits.max_nesting_depth),
        }
    }
}

/// Collects runs, merging neighbours that share every attribute.
#[derive(Debug, Default)]
struct RunBuilder {
    runs: Vec<SemanticRun>,
}

impl RunBuilder {
    fn push(&mut self, text: &str, block: Option<&BlockIntent>, inline: InlineKind, link: Option<&str>) {
        if let Some(last) = self.runs.last_mut() {
            let same = !inline.is_break()
                && !last.inline.is_break()
                && last.inline == inline
                && last.block.as_ref() == block
                && last.link.as_deref() == link;
            if same {
                last.text.push_str(text);
                return;
            }
        }

        self.runs.push(SemanticRun {
            text: text.to_string(),
            block: block.cloned(),
            inline,
            link: link.map(str::to_string),
        });
    }

    fn finish(self) -> Vec<SemanticRun> {
        self.runs
    }
}

/// Stack of active inline styles; the effective style is their union.
#[derive(Debug, Default)]
struct InlineStack {
    kinds: Vec<InlineKind>,
    links: Vec<String>,
}

impl InlineStack {
    fn current(&self) -> InlineKind {
        self.kinds.iter().fold(InlineKind::empty(), |acc, k| acc | *k)
    }

    fn link(&self) -> Option<&str> {
        self.links.last().map(String::as_str)
    }

    fn depth(&self) -> usize {
        self.kinds.len() + self.links.len()
    }

    fn check_depth(&self, max: usize) -> anyhow::Result<()> {
        if self.depth() > max {
            bail!("inline nesting deeper than {max}");
        }
        Ok(())
    }

    fn push(&mut self, kind: InlineKind, max: usize) -> anyhow::Result<()> {
        self.kinds.push(kind);
        self.check_depth(max)
    }

    fn push_link(&mut self, url: &str, max: usize) -> anyhow::Result<()> {
        self.links.push(url.to_string());
        self.check_depth(max)
    }

    fn pop(&mut self) {
        self.kinds.pop();
    }

    fn pop_link(&mut self) {
        self.links.pop();
    }
}

/// Block-level walk state for full mode.
struct FullWalker {
    max_depth: usize,
    next_id: u32,
    /// Open block containers, innermost last. `None` entries are containers
    /// that do not own text (lists, tables, rows).
    blocks: Vec<Option<BlockIntent>>,
    /// Next item number per open list (`None` for bullet lists).
    lists: Vec<Option<u64>>,
    table_column: usize,
    inline: InlineStack,
    code: Option<String>,
    out: RunBuilder,
}

impl FullWalker {
    fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            next_id: 0,
            blocks: Vec::new(),
            lists: Vec::new(),
            table_column: 0,
            inline: InlineStack::default(),
            code: None,
            out: RunBuilder::default(),
        }
    }

    fn current_block(&self) -> Option<&BlockIntent> {
        self.blocks.iter().rev().find_map(Option::as_ref)
    }

    fn open_block(&mut self, kind: Option<BlockKind>) -> anyhow::Result<()> {
        let intent = kind.map(|kind| {
            let id = BlockId(self.next_id);
            self.next_id += 1;
            BlockIntent { id, kind }
        });
        self.blocks.push(intent);
        if self.blocks.len() > self.max_depth {
            bail!("block nesting deeper than {}", self.max_depth);
        }
        Ok(())
    }

    fn close_block(&mut self) {
        self.blocks.pop();
    }

    fn text(&mut self, text: &str, extra: InlineKind) {
        if let Some(code) = self.code.as_mut() {
            code.push_str(text);
            return;
        }
        let inline = self.inline.current() | extra;
        let block = self.blocks.iter().rev().find_map(Option::as_ref);
        self.out.push(text, block, inline, self.inline.link());
    }

    fn event(&mut self, event: Event<'_>) -> anyhow::Result<()> {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text, InlineKind::empty()),
            Event::Code(code) => self.text(&code, InlineKind::CODE),
            Event::SoftBreak => self.text("\n", InlineKind::SOFT_BREAK),
            Event::HardBreak => self.text("\n", InlineKind::LINE_BREAK),
            // Raw HTML, rules, footnotes and math carry no styled text.
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> anyhow::Result<()> {
        match tag {
            Tag::Paragraph => self.open_block(Some(BlockKind::Paragraph))?,
            Tag::Heading { level, .. } => self.open_block(Some(BlockKind::Heading {
                level: level as u8,
            }))?,
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.open_block(Some(BlockKind::CodeBlock { language }))?;
                self.code = Some(String::new());
            }
            Tag::BlockQuote(_) => self.open_block(Some(BlockKind::BlockQuote))?,
            Tag::List(start) => {
                self.lists.push(start);
                self.open_block(None)?;
            }
            Tag::Item => {
                let ordinal = self.lists.last().copied().flatten();
                self.open_block(Some(BlockKind::ListItem { ordinal }))?;
            }
            Tag::Table(_) => self.open_block(None)?,
            Tag::TableHead | Tag::TableRow => {
                self.table_column = 0;
                self.open_block(None)?;
            }
            Tag::TableCell => {
                let column = self.table_column;
                self.open_block(Some(BlockKind::TableCell { column }))?;
            }
            Tag::Emphasis => self.inline.push(InlineKind::EMPHASIS, self.max_depth)?,
            Tag::Strong => self.inline.push(InlineKind::STRONG, self.max_depth)?,
            Tag::Strikethrough => self.inline.push(InlineKind::STRIKETHROUGH, self.max_depth)?,
            Tag::Link { dest_url, .. } => self.inline.push_link(&dest_url, self.max_depth)?,
            // Image alt text flows through as ordinary text.
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                let mut code = self.code.take().unwrap_or_default();
                if code.ends_with('\n') {
                    code.pop();
                }
                let block = self.current_block().cloned();
                self.out.push(&code, block.as_ref(), InlineKind::empty(), None);
                self.close_block();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.close_block();
            }
            TagEnd::Item => {
                if let Some(Some(n)) = self.lists.last_mut() {
                    *n += 1;
                }
                self.close_block();
            }
            TagEnd::TableCell => {
                self.table_column += 1;
                self.close_block();
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow => self.close_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.inline.pop(),
            TagEnd::Link => self.inline.pop_link(),
            _ => {}
        }
    }
}

fn parse_full(text: &str, max_depth: usize) -> anyhow::Result<Vec<SemanticRun>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut walker = FullWalker::new(max_depth);
    for event in Parser::new_ext(text, options) {
        walker.event(event)?;
    }
    Ok(walker.out.finish())
}

fn parse_inline_only(text: &str, max_depth: usize) -> anyhow::Result<Vec<SemanticRun>> {
    let block = BlockIntent {
        id: BlockId(0),
        kind: BlockKind::Paragraph,
    };
    let mut out = RunBuilder::default();

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push("\n", Some(&block), InlineKind::LINE_BREAK, None);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);

        let body = line.trim_start_matches([' ', '\t']);
        let leading = &line[..line.len() - body.len()];
        let trimmed = body.trim_end_matches([' ', '\t']);
        let trailing = &body[trimmed.len()..];

        if !leading.is_empty() {
            out.push(leading, Some(&block), InlineKind::empty(), None);
        }
        if !trimmed.is_empty() {
            parse_inline_line(trimmed, &block, max_depth, &mut out)?;
        }
        if !trailing.is_empty() {
            out.push(trailing, Some(&block), InlineKind::empty(), None);
        }
    }

    Ok(out.finish())
}

fn parse_inline_line(
    line: &str,
    block: &BlockIntent,
    max_depth: usize,
    out: &mut RunBuilder,
) -> anyhow::Result<()> {
    let escaped = escape_block_start(line);
    let mut inline = InlineStack::default();

    for event in Parser::new_ext(&escaped, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(Tag::Emphasis) => inline.push(InlineKind::EMPHASIS, max_depth)?,
            Event::Start(Tag::Strong) => inline.push(InlineKind::STRONG, max_depth)?,
            Event::Start(Tag::Strikethrough) => inline.push(InlineKind::STRIKETHROUGH, max_depth)?,
            Event::Start(Tag::Link { dest_url, .. }) => inline.push_link(&dest_url, max_depth)?,
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough) => inline.pop(),
            Event::End(TagEnd::Link) => inline.pop_link(),
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                out.push(&text, Some(block), inline.current(), inline.link());
            }
            Event::Code(code) => {
                out.push(&code, Some(block), inline.current() | InlineKind::CODE, inline.link());
            }
            Event::SoftBreak | Event::HardBreak => {
                out.push("\n", Some(block), InlineKind::LINE_BREAK, None);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Escapes the marker that would make `line` open a block construct, so the
/// parser only sees inline syntax. `line` has no leading whitespace.
fn escape_block_start(line: &str) -> String {
    match block_marker_offset(line) {
        Some(at) => {
            let mut escaped = String::with_capacity(line.len() + 1);
            escaped.push_str(&line[..at]);
            escaped.push('\\');
            escaped.push_str(&line[at..]);
            escaped
        }
        None => line.to_string(),
    }
}

fn block_marker_offset(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let first = *bytes.first()?;
    let followed_by_space = |at: usize| bytes.get(at).is_none_or(|b| matches!(b, b' ' | b'\t'));

    match first {
        b'>' => Some(0),
        b'#' => {
            let hashes = bytes.iter().take_while(|&&b| b == b'#').count();
            (hashes <= 6 && followed_by_space(hashes)).then_some(0)
        }
        b'-' | b'+' | b'*' => {
            (followed_by_space(1) || is_thematic_break(line, first)).then_some(0)
        }
        b'_' => is_thematic_break(line, first).then_some(0),
        b'`' | b'~' => {
            let run = bytes.iter().take_while(|&&b| b == first).count();
            let info_has_backtick = first == b'`' && bytes[run..].contains(&b'`');
            (run >= 3 && !info_has_backtick).then_some(0)
        }
        b'<' => is_html_block_start(line).then_some(0),
        b'[' => line.contains("]:").then_some(0),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let delim = bytes.get(digits).copied();
            (digits <= 9 && matches!(delim, Some(b'.' | b')')) && followed_by_space(digits + 1))
                .then_some(digits)
        }
        _ => None,
    }
}

fn is_thematic_break(line: &str, marker: u8) -> bool {
    let mut count = 0;
    for b in line.bytes() {
        match b {
            b' ' | b'\t' => {}
            b if b == marker => count += 1,
            _ => return false,
        }
    }
    count >= 3
}

fn is_html_block_start(line: &str) -> bool {
    let rest = &line[1..];
    let Some(next) = rest.chars().next() else {
        return false;
    };
    if !(next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')) {
        return false;
    }
    // `<scheme:...>` and `<user@host>` are autolinks, not HTML.
    let head = rest.split('>').next().unwrap_or(rest);
    !(head.contains(':') || head.contains('@')) || head.contains(char::is_whitespace)
}
