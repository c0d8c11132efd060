//! The parsed-document shape the normalizer consumes.
//!
//! Any CommonMark/GFM parser can feed the engine by producing this tree; the
//! [`pulldown`](super::pulldown) adapter is the one shipped here.

use crate::models::Align;

/// Container and leaf nodes of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceNode {
    Quote(Vec<SourceNode>),
    List {
        ordered: bool,
        /// Glyph used by unordered lists (`-`, `*`, `+`).
        bullet: char,
        start: u64,
        items: Vec<SourceListItem>,
    },
    Paragraph(Vec<SourceInline>),
    Heading {
        level: u8,
        inlines: Vec<SourceInline>,
    },
    ThematicBreak,
    CodeBlock {
        kind: CodeKind,
        text: String,
    },
    Table {
        aligns: Vec<Align>,
        /// First row is the header row.
        rows: Vec<Vec<Vec<SourceInline>>>,
    },
    Html(String),
    /// Any construct this model has no block for (footnote definitions,
    /// metadata, definition lists). Skipped by the normalizer.
    Unknown(&'static str),
}

/// A list item; `order` is the item's number for ordered lists, else 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceListItem {
    pub order: u64,
    pub children: Vec<SourceNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    Fenced(Option<String>),
    Indented,
    Math,
}

/// Inline spans inside a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceInline {
    Text(String),
    /// `delims` is 1 for emphasis, 2 for strong.
    Emphasis {
        delims: u8,
        children: Vec<SourceInline>,
    },
    Strikethrough(Vec<SourceInline>),
    Code(String),
    Math(String),
    Link {
        url: String,
        title: String,
        is_image: bool,
        children: Vec<SourceInline>,
    },
    Autolink(String),
    /// Raw tag text, e.g. `<u>` or `</a>`.
    Html(String),
    HardBreak,
    SoftBreak,
    /// Character reference from parsers that keep entities apart from text.
    Entity {
        raw: String,
        decoded: String,
    },
    /// An inline container this model has no styling for; its text is kept.
    Unknown(Vec<SourceInline>),
}

impl SourceInline {
    pub fn text(text: impl Into<String>) -> Self {
        SourceInline::Text(text.into())
    }
}
