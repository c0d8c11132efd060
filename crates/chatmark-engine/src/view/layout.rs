use crate::models::{Block, BlockKind, ListMarker};

/// Presentation attributes derived from a block, recomputed whenever a leaf's
/// block changes. Units are text lines and columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutHints {
    pub margin_top: u8,
    pub margin_bottom: u8,
    /// Columns of list indentation before the block's text.
    pub indent: u16,
    /// Quote bars drawn to the left of the block.
    pub quote_bars: u8,
    pub monospace: bool,
    /// Marker painted in the indentation of a list head (`"3."`, `"•"`).
    pub list_marker: Option<String>,
}

impl LayoutHints {
    pub fn for_block(block: &Block) -> Self {
        let (margin_top, margin_bottom) = match block.kind() {
            BlockKind::Heading(1 | 2) => (2, 1),
            BlockKind::Heading(_) => (1, 1),
            BlockKind::Paragraph if block.list_level() > 0 => (0, 0),
            BlockKind::Paragraph => (0, 1),
            BlockKind::Rule => (1, 1),
            BlockKind::FencedCode
            | BlockKind::IndentedCode
            | BlockKind::MathCode
            | BlockKind::Table => (1, 1),
        };
        let list_marker = match block.list_marker() {
            _ if block.list_level() == 0 => None,
            ListMarker::Ordered(n) => Some(format!("{n}.")),
            ListMarker::Bullet(_) => Some("•".to_string()),
            ListMarker::Continuation => None,
        };
        Self {
            margin_top,
            margin_bottom,
            indent: u16::from(block.list_level()) * 2,
            quote_bars: block.quote_level(),
            monospace: block.kind().is_code() || block.kind() == BlockKind::Table,
            list_marker,
        }
    }
}
