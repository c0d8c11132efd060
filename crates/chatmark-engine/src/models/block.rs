use crate::render::{self, OutputFormat};

use super::element::{Element, merge_elements, plain_text};
use super::table::Table;

/// Deepest block-quote nesting a block can express; deeper input is clamped.
pub const MAX_QUOTE_LEVEL: u8 = 8;
/// Deepest list nesting a block can express; deeper input is clamped.
pub const MAX_LIST_LEVEL: u8 = 8;

/// Markdown block type. Closed set, matched exhaustively by every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    /// ATX/setext heading, level 1..=6
    Heading(u8),
    Rule,
    FencedCode,
    IndentedCode,
    Table,
    MathCode,
}

impl BlockKind {
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading(level.clamp(1, 6))
    }

    pub fn is_code(self) -> bool {
        matches!(
            self,
            BlockKind::FencedCode | BlockKind::IndentedCode | BlockKind::MathCode
        )
    }
}

/// How a block participates in a list, derived from its list fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    None,
    Ordered,
    Bullet,
    Continuation,
}

/// Marker requested when placing a block inside a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Ordered(u32),
    Bullet(char),
    Continuation,
}

/// One markdown-level unit: paragraph, heading, code region, table or rule.
///
/// Blocks are immutable values. The `with_*` methods consume and return the
/// block so a normalizer can assemble one, after which it is only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    quote_level: u8,
    list_level: u8,
    list_order: u32,
    list_bullet: Option<char>,
    lang: Option<String>,
    table: Option<Table>,
    elements: Vec<Element>,
}

impl Block {
    pub fn new(kind: BlockKind, elements: Vec<Element>) -> Self {
        Self {
            kind,
            quote_level: 0,
            list_level: 0,
            list_order: 0,
            list_bullet: None,
            lang: None,
            table: None,
            elements,
        }
    }

    pub fn paragraph(elements: Vec<Element>) -> Self {
        Self::new(BlockKind::Paragraph, elements)
    }

    pub fn rule() -> Self {
        Self::new(BlockKind::Rule, Vec::new())
    }

    /// A code block holding `code` verbatim as a single run.
    pub fn code(kind: BlockKind, code: impl Into<String>) -> Self {
        let code = code.into();
        let elements = if code.is_empty() {
            Vec::new()
        } else {
            vec![Element::plain(code)]
        };
        Self::new(kind, elements)
    }

    /// A table block; `elements` carry the monospace plain-text rendition.
    pub fn table_block(table: Table) -> Self {
        let rendered = render::unicode::render_table(&table);
        let mut block = Self::new(
            BlockKind::Table,
            vec![Element::new(rendered, super::Styling::MONO)],
        );
        block.table = Some(table);
        block
    }

    pub fn with_quote_level(mut self, level: u8) -> Self {
        self.quote_level = level.min(MAX_QUOTE_LEVEL);
        self
    }

    /// Places the block in a list at `level`. Level 0 clears any marker.
    pub fn with_list(mut self, level: u8, marker: ListMarker) -> Self {
        self.list_level = level.min(MAX_LIST_LEVEL);
        self.list_order = 0;
        self.list_bullet = None;
        if self.list_level > 0 {
            match marker {
                ListMarker::Ordered(order) => self.list_order = order.max(1),
                ListMarker::Bullet(bullet) => self.list_bullet = Some(bullet),
                ListMarker::Continuation => {}
            }
        }
        self
    }

    pub fn with_lang(mut self, lang: Option<String>) -> Self {
        self.lang = lang.filter(|l| !l.is_empty());
        self
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = elements;
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn quote_level(&self) -> u8 {
        self.quote_level
    }

    pub fn list_level(&self) -> u8 {
        self.list_level
    }

    pub fn list_order(&self) -> u32 {
        self.list_order
    }

    pub fn list_bullet(&self) -> Option<char> {
        self.list_bullet
    }

    /// Fenced-code info string. Only meaningful for [`BlockKind::FencedCode`].
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn list_kind(&self) -> ListKind {
        if self.list_level == 0 {
            ListKind::None
        } else if self.list_order > 0 {
            ListKind::Ordered
        } else if self.list_bullet.is_some() {
            ListKind::Bullet
        } else {
            ListKind::Continuation
        }
    }

    /// True when this block introduces a list item marker.
    pub fn is_list_head(&self) -> bool {
        matches!(self.list_kind(), ListKind::Ordered | ListKind::Bullet)
    }

    /// The current marker, as accepted by [`Block::with_list`].
    pub fn list_marker(&self) -> ListMarker {
        match (self.list_order, self.list_bullet) {
            (order, _) if order > 0 => ListMarker::Ordered(order),
            (_, Some(bullet)) => ListMarker::Bullet(bullet),
            _ => ListMarker::Continuation,
        }
    }

    /// `(quote_level, list_level)`; blocks sharing it render in one level group.
    pub fn nesting(&self) -> (u8, u8) {
        (self.quote_level, self.list_level)
    }

    pub fn is_nested(&self) -> bool {
        self.quote_level > 0 || self.list_level > 0
    }

    pub fn plain_text(&self) -> String {
        plain_text(&self.elements)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(Element::is_empty) && self.table.is_none()
    }

    /// Copy of this block with adjacent identically styled runs joined.
    pub fn merged(&self) -> Block {
        let mut block = self.clone();
        block.elements = merge_elements(block.elements);
        block
    }

    pub fn to_string(&self, format: OutputFormat) -> String {
        render::render_blocks(std::slice::from_ref(self), format)
    }

    pub(crate) fn trim_trailing_whitespace(mut self) -> Self {
        if !self.kind.is_code()
            && self.kind != BlockKind::Table
            && let Some(last) = self.elements.pop()
        {
            self.elements.push(last.trimmed_end());
            self.elements = merge_elements(self.elements);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ListMarker::Ordered(3), ListKind::Ordered)]
    #[case(ListMarker::Bullet('-'), ListKind::Bullet)]
    #[case(ListMarker::Continuation, ListKind::Continuation)]
    fn list_kind_follows_marker(#[case] marker: ListMarker, #[case] expected: ListKind) {
        let block = Block::paragraph(vec![]).with_list(1, marker);
        assert_eq!(block.list_kind(), expected);
        assert!(!(block.list_order() > 0 && block.list_bullet().is_some()));
    }

    #[test]
    fn level_zero_never_carries_a_marker() {
        let block = Block::paragraph(vec![]).with_list(0, ListMarker::Ordered(4));
        assert_eq!(block.list_kind(), ListKind::None);
        assert_eq!(block.list_order(), 0);
        assert_eq!(block.list_bullet(), None);
    }

    #[test]
    fn levels_are_clamped() {
        let block = Block::paragraph(vec![])
            .with_quote_level(200)
            .with_list(99, ListMarker::Bullet('*'));
        assert_eq!(block.quote_level(), MAX_QUOTE_LEVEL);
        assert_eq!(block.list_level(), MAX_LIST_LEVEL);
    }

    #[test]
    fn heading_level_is_clamped() {
        assert_eq!(BlockKind::heading(0), BlockKind::Heading(1));
        assert_eq!(BlockKind::heading(9), BlockKind::Heading(6));
    }

    #[test]
    fn empty_lang_is_none() {
        let block = Block::code(BlockKind::FencedCode, "x").with_lang(Some(String::new()));
        assert_eq!(block.lang(), None);
    }

    #[test]
    fn trailing_whitespace_trim_keeps_code() {
        let para = Block::paragraph(vec![Element::plain("hi  ")]).trim_trailing_whitespace();
        assert_eq!(para.plain_text(), "hi");

        let code = Block::code(BlockKind::IndentedCode, "x  ").trim_trailing_whitespace();
        assert_eq!(code.plain_text(), "x  ");
    }
}
