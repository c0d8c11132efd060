//! Plain text writer for monospace and terminal display.

use unicode_width::UnicodeWidthStr;

use super::{TextBlocks, indent_code};
use crate::models::element::plain_text;
use crate::models::{Block, BlockKind, Element, ListMarker, Table};

const BULLET: char = '•';
const RULE_WIDTH: usize = 20;
const COLUMN_SEPARATOR: &str = " │ ";

pub(crate) struct UnicodeWriter;

impl TextBlocks for UnicodeWriter {
    fn marker(&self, marker: ListMarker) -> String {
        match marker {
            ListMarker::Ordered(n) => format!("{n}. "),
            ListMarker::Bullet(_) => format!("{BULLET} "),
            ListMarker::Continuation => String::new(),
        }
    }

    fn body(&self, block: &Block) -> String {
        match block.kind() {
            BlockKind::Paragraph => render_inline(block.elements()),
            BlockKind::Heading(_) => render_inline(block.elements()).replace('\n', " "),
            BlockKind::Rule => "─".repeat(RULE_WIDTH),
            BlockKind::FencedCode | BlockKind::IndentedCode | BlockKind::MathCode => {
                indent_code(&block.plain_text())
            }
            BlockKind::Table => match block.table() {
                Some(table) => render_table(table),
                None => block.plain_text(),
            },
        }
    }
}

/// Inline runs as plain text; links show their text only.
pub fn render_inline(elements: &[Element]) -> String {
    plain_text(elements)
}

/// Display columns of `text`. Tabs count as one column. Emoji ZWJ and
/// presentation sequences are measured as one wide glyph.
pub fn display_width(text: &str) -> usize {
    let tabs = text.matches('\t').count();
    text.split('\t').map(UnicodeWidthStr::width).sum::<usize>() + tabs
}

/// Pads every cell to its column's widest cell, with a rule under the header.
pub fn render_table(table: &Table) -> String {
    let texts: Vec<Vec<String>> = (0..table.rows())
        .map(|r| (0..table.cols()).map(|c| table.cell_text(r, c)).collect())
        .collect();
    let widths: Vec<usize> = (0..table.cols())
        .map(|c| {
            texts
                .iter()
                .map(|row| display_width(&row[c]))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(texts.len() + 1);
    for (r, row) in texts.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(text, width)| {
                let pad = width.saturating_sub(display_width(text));
                format!("{text}{}", " ".repeat(pad))
            })
            .collect();
        lines.push(cells.join(COLUMN_SEPARATOR));
        if r == 0 {
            let total = widths.iter().sum::<usize>()
                + COLUMN_SEPARATOR.chars().count() * (widths.len() - 1);
            lines.push("─".repeat(total));
        }
    }
    lines.join("\n")
}
