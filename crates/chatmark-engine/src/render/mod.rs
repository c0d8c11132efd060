//! Serializers from a block sequence to markdown, plain unicode text or HTML.
//!
//! Markdown and unicode output share the line-oriented layout in
//! [`write_text_blocks`]: quote prefixes, list markers, continuation
//! indentation and blank-line separation. HTML nests real elements instead.

pub mod html;
pub mod markdown;
pub mod unicode;

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;
use crate::models::{Block, Element, Link, ListMarker};

pub(crate) const QUOTE_PREFIX: &str = "> ";

/// Default continuation indent for a list level with no recorded head.
const DEFAULT_MARKER_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Markdown,
    PlainUnicode,
    Html,
}

impl FromStr for OutputFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "unicode" | "plain" | "text" => Ok(OutputFormat::PlainUnicode),
            "html" => Ok(OutputFormat::Html),
            _ => Err(EngineError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::PlainUnicode => "unicode",
            OutputFormat::Html => "html",
        })
    }
}

pub fn render_blocks(blocks: &[Block], format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => write_text_blocks(blocks, &markdown::MarkdownWriter),
        OutputFormat::PlainUnicode => write_text_blocks(blocks, &unicode::UnicodeWriter),
        OutputFormat::Html => html::render_blocks(blocks),
    }
}

pub fn render_elements(elements: &[Element], format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => markdown::render_inline(elements),
        OutputFormat::PlainUnicode => unicode::render_inline(elements),
        OutputFormat::Html => html::render_inline(elements),
    }
}

/// Per-format hooks for the line-oriented writers.
pub(crate) trait TextBlocks {
    /// Marker text for a list head, including its trailing space.
    fn marker(&self, marker: ListMarker) -> String;

    /// Block body without quote or list prefixes; lines separated by `\n`.
    fn body(&self, block: &Block) -> String;
}

pub(crate) fn write_text_blocks(blocks: &[Block], writer: &impl TextBlocks) -> String {
    let mut out = String::new();
    // Marker width of the most recent head at each list level.
    let mut widths: Vec<usize> = Vec::new();
    let mut prev: Option<&Block> = None;

    for block in blocks {
        if let Some(prev) = prev {
            out.push('\n');
            if needs_blank_line(prev, block) {
                let depth = prev.quote_level().min(block.quote_level());
                out.push_str(&QUOTE_PREFIX.repeat(depth.into()));
                out.push('\n');
            }
        }
        prev = Some(block);

        let level = usize::from(block.list_level());
        let quote = QUOTE_PREFIX.repeat(block.quote_level().into());
        let head = block
            .is_list_head()
            .then(|| writer.marker(block.list_marker()));

        if let Some(marker) = &head {
            widths.resize(level - 1, DEFAULT_MARKER_WIDTH);
            widths.push(marker.chars().count());
        } else if level == 0 {
            widths.clear();
        }
        let width_at = |l: usize| widths.get(l).copied().unwrap_or(DEFAULT_MARKER_WIDTH);
        let outer_indent: usize = (0..level.saturating_sub(1)).map(width_at).sum();
        let inner_indent: usize = (0..level).map(width_at).sum();

        let body = writer.body(block);
        for (i, line) in body.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match (&head, i) {
                (Some(marker), 0) => {
                    out.push_str(&quote);
                    out.push_str(&" ".repeat(outer_indent));
                    if line.is_empty() {
                        out.push_str(marker.trim_end());
                    } else {
                        out.push_str(marker);
                        out.push_str(line);
                    }
                }
                _ if line.is_empty() => out.push_str(&quote),
                _ => {
                    out.push_str(&quote);
                    out.push_str(&" ".repeat(inner_indent));
                    out.push_str(line);
                }
            }
        }
    }
    out
}

/// Blank line between blocks unless the next one opens a deeper quote or
/// heads an item that safely continues the previous list.
fn needs_blank_line(prev: &Block, cur: &Block) -> bool {
    if cur.quote_level() > prev.quote_level() {
        return false;
    }
    let continues_list = cur.quote_level() == prev.quote_level()
        && cur.is_list_head()
        && prev.list_level() > 0
        && (cur.list_bullet().is_some()
            || cur.list_order() == 1
            || cur.list_level() <= prev.list_level());
    !continues_list
}

/// Indents every non-empty line by four spaces.
pub(crate) fn indent_code(code: &str) -> String {
    code.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits runs into maximal groups sharing the same link.
pub(crate) fn link_runs(elements: &[Element]) -> impl Iterator<Item = (Option<&Link>, &[Element])> {
    elements
        .chunk_by(|a, b| a.link() == b.link())
        .map(|run| (run[0].link(), run))
}
