pub mod inline;
pub mod normalize;
pub mod pulldown;
pub mod tree;

#[cfg(test)]
mod tests;

use std::borrow::Cow;

use crate::models::{Block, BlockKind};

pub use normalize::normalize;

/// Flags recognized by parse and update calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Input is already clean; skip sanitization.
    pub presanitize: bool,
    /// Keep text only: no styling, no links, raw HTML tags kept as text.
    pub ignore_inline: bool,
    /// Do not turn bare `http(s)://` URLs into links.
    pub ignore_plain_links: bool,
    /// Unrecognized inline HTML tags become code spans instead of being dropped.
    pub inline_html_as_code: bool,
    /// Images become ordinary links showing their alt text.
    pub image_as_link: bool,
    /// More content is expected; skip the final normalization step.
    pub chunking: bool,
}

/// Parses markdown text into normalized blocks.
pub fn parse_markdown(text: &str, options: &ParseOptions) -> Vec<Block> {
    let text = if options.presanitize {
        Cow::Borrowed(text)
    } else {
        sanitize(text)
    };
    let tree = pulldown::build_tree(&text);
    let blocks = normalize(&tree, options);
    if options.chunking {
        blocks
    } else {
        finalize(blocks)
    }
}

/// Normalizes line endings and strips control characters other than tab and
/// newline. NUL becomes U+FFFD.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    let clean = |c: char| c == '\t' || c == '\n' || !c.is_ascii_control();
    if text.chars().all(clean) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push('\n');
            }
            '\0' => out.push(char::REPLACEMENT_CHARACTER),
            c if clean(c) => out.push(c),
            _ => {}
        }
    }
    Cow::Owned(out)
}

/// Drops trailing empty paragraphs and list heads, then trims trailing
/// whitespace from the last block.
pub fn finalize(mut blocks: Vec<Block>) -> Vec<Block> {
    while blocks
        .last()
        .is_some_and(|b| b.kind() == BlockKind::Paragraph && b.is_empty())
    {
        blocks.pop();
    }
    if let Some(last) = blocks.pop() {
        blocks.push(last.trim_trailing_whitespace());
    }
    blocks
}
