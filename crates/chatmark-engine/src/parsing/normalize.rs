//! Converts the parsed container tree into a flat, nesting-aware block list.

use super::ParseOptions;
use super::inline::{InlineFlattener, split_html, trim_elements};
use super::tree::{CodeKind, SourceInline, SourceListItem, SourceNode};
use crate::models::{Block, BlockKind, Element, ListMarker, MAX_LIST_LEVEL, MAX_QUOTE_LEVEL, Table};

/// Flattens `nodes` into blocks, threading quote and list depth.
pub fn normalize(nodes: &[SourceNode], options: &ParseOptions) -> Vec<Block> {
    let mut normalizer = Normalizer::new(options);
    normalizer.nodes(nodes);
    normalizer.out
}

struct Normalizer<'o> {
    options: &'o ParseOptions,
    out: Vec<Block>,
    quote_level: u8,
    list_level: u8,
    /// Marker of the innermost list item that has not produced a block yet.
    pending_head: Option<(u8, ListMarker)>,
}

impl<'o> Normalizer<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            out: Vec::new(),
            quote_level: 0,
            list_level: 0,
            pending_head: None,
        }
    }

    fn nodes(&mut self, nodes: &[SourceNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &SourceNode) {
        match node {
            SourceNode::Quote(children) => {
                let saved = self.quote_level;
                // quotes inside list items stay at the item's quote level
                if self.list_level == 0 {
                    self.quote_level = (saved + 1).min(MAX_QUOTE_LEVEL);
                }
                self.nodes(children);
                self.quote_level = saved;
            }
            SourceNode::List {
                ordered,
                bullet,
                items,
                ..
            } => self.list(*ordered, *bullet, items),
            SourceNode::Paragraph(inlines) => {
                let elements = self.inlines(inlines);
                if !elements.is_empty() {
                    self.emit(Block::paragraph(elements));
                }
            }
            SourceNode::Heading { level, inlines } => {
                let elements = self.inlines(inlines);
                self.emit(Block::new(BlockKind::heading(*level), elements));
            }
            SourceNode::ThematicBreak => self.emit(Block::rule()),
            SourceNode::CodeBlock { kind, text } => {
                let code = text.strip_suffix('\n').unwrap_or(text);
                let block = match kind {
                    CodeKind::Fenced(lang) => {
                        Block::code(BlockKind::FencedCode, code).with_lang(lang.clone())
                    }
                    CodeKind::Indented => Block::code(BlockKind::IndentedCode, code),
                    CodeKind::Math => Block::code(BlockKind::MathCode, code),
                };
                self.emit(block);
            }
            SourceNode::Table { aligns, rows } => {
                let rows = rows
                    .iter()
                    .map(|row| row.iter().map(|cell| self.inlines(cell)).collect())
                    .collect();
                self.emit(Block::table_block(Table::new(aligns.clone(), rows)));
            }
            SourceNode::Html(html) => {
                let elements = trim_elements(self.inlines(&split_html(html)));
                if elements.is_empty() {
                    log::debug!("skipping empty html block");
                } else {
                    self.emit(Block::paragraph(elements));
                }
            }
            SourceNode::Unknown(what) => log::debug!("skipping {what}"),
        }
    }

    fn list(&mut self, ordered: bool, bullet: char, items: &[SourceListItem]) {
        let saved = self.list_level;
        self.list_level = (saved + 1).min(MAX_LIST_LEVEL);
        for item in items {
            let marker = if ordered {
                ListMarker::Ordered(u32::try_from(item.order).unwrap_or(u32::MAX))
            } else {
                ListMarker::Bullet(bullet)
            };
            self.flush_pending();
            self.pending_head = Some((self.list_level, marker));
            self.nodes(&item.children);
            self.flush_pending();
        }
        self.list_level = saved;
    }

    /// Emits an empty head paragraph for an item whose marker is still pending.
    fn flush_pending(&mut self) {
        if let Some((level, marker)) = self.pending_head.take() {
            self.out.push(
                Block::paragraph(Vec::new())
                    .with_quote_level(self.quote_level)
                    .with_list(level, marker),
            );
        }
    }

    fn emit(&mut self, block: Block) {
        let block = block.with_quote_level(self.quote_level);
        let marker = match self.pending_head {
            Some((level, marker)) if level == self.list_level => {
                self.pending_head = None;
                marker
            }
            Some(_) => {
                self.flush_pending();
                ListMarker::Continuation
            }
            None => ListMarker::Continuation,
        };
        self.out.push(block.with_list(self.list_level, marker));
    }

    fn inlines(&self, inlines: &[SourceInline]) -> Vec<Element> {
        InlineFlattener::new(self.options).flatten(inlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListKind, Styling};
    use crate::parsing::pulldown::build_tree;
    use pretty_assertions::assert_eq;

    fn blocks(md: &str) -> Vec<Block> {
        normalize(&build_tree(md), &ParseOptions::default())
    }

    fn shape(blocks: &[Block]) -> Vec<(u8, u8, ListMarker, String)> {
        blocks
            .iter()
            .map(|b| {
                (
                    b.quote_level(),
                    b.list_level(),
                    b.list_marker(),
                    b.plain_text(),
                )
            })
            .collect()
    }

    #[test]
    fn nested_quotes_raise_quote_level() {
        let out = blocks("> Body1\n> >Body2");
        assert_eq!(
            shape(&out),
            vec![
                (1, 0, ListMarker::Continuation, "Body1".to_string()),
                (2, 0, ListMarker::Continuation, "Body2".to_string()),
            ]
        );
    }

    #[test]
    fn item_head_then_continuation() {
        let out = blocks("1. first\n\n   second para\n2. next\n");
        assert_eq!(
            shape(&out),
            vec![
                (0, 1, ListMarker::Ordered(1), "first".to_string()),
                (0, 1, ListMarker::Continuation, "second para".to_string()),
                (0, 1, ListMarker::Ordered(2), "next".to_string()),
            ]
        );
    }

    #[test]
    fn item_without_own_block_gets_empty_head() {
        let out = blocks("- \n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].list_kind(), ListKind::Bullet);
        assert!(out[0].elements().is_empty());

        let out = blocks("-\n  - inner\n");
        assert_eq!(
            shape(&out),
            vec![
                (0, 1, ListMarker::Bullet('-'), String::new()),
                (0, 2, ListMarker::Bullet('-'), "inner".to_string()),
            ]
        );
    }

    #[test]
    fn quote_inside_list_keeps_quote_level() {
        let out = blocks("- item\n\n  > quoted\n");
        assert_eq!(
            shape(&out),
            vec![
                (0, 1, ListMarker::Bullet('-'), "item".to_string()),
                (0, 1, ListMarker::Continuation, "quoted".to_string()),
            ]
        );
    }

    #[test]
    fn list_inside_quote_carries_both_levels() {
        let out = blocks("> + a\n> + b\n");
        assert_eq!(
            shape(&out),
            vec![
                (1, 1, ListMarker::Bullet('+'), "a".to_string()),
                (1, 1, ListMarker::Bullet('+'), "b".to_string()),
            ]
        );
    }

    #[test]
    fn code_loses_one_trailing_newline() {
        let out = blocks("```rust\nlet x = 1;\n\n```\n");
        assert_eq!(out[0].kind(), BlockKind::FencedCode);
        assert_eq!(out[0].lang(), Some("rust"));
        assert_eq!(out[0].plain_text(), "let x = 1;\n");
    }

    #[test]
    fn math_fence_is_math_code() {
        let out = blocks("```math\na+b\n```\n");
        assert_eq!(out[0].kind(), BlockKind::MathCode);
        assert_eq!(out[0].plain_text(), "a+b");
    }

    #[test]
    fn soft_breaks_become_spaces() {
        let out = blocks("one\ntwo  \nthree");
        assert_eq!(out[0].plain_text(), "one two\nthree");
    }

    #[test]
    fn tables_hold_structure_and_mono_rendition() {
        let out = blocks("| A | B |\n|---|---|\n| a | **b** |\n");
        let table = out[0].table().expect("table block");
        assert_eq!(table.cols(), 2);
        assert_eq!(table.cell(1, 1), Some(&[Element::new("b", Styling::STRONG)][..]));
        assert_eq!(out[0].elements()[0].styling(), Styling::MONO);
        assert_eq!(out[0].plain_text(), "A │ B\n─────\na │ b");
    }

    #[test]
    fn empty_html_blocks_are_skipped() {
        let out = blocks("<div>\n</div>\n\ntext");
        assert_eq!(shape(&out), vec![(0, 0, ListMarker::Continuation, "text".to_string())]);
    }

    #[test]
    fn html_blocks_are_flattened() {
        let out = blocks("<div>\n<b>bold</b> words\n</div>\n");
        assert_eq!(
            out[0].elements(),
            &[
                Element::new("bold", Styling::STRONG),
                Element::plain(" words"),
            ]
        );
    }
}
