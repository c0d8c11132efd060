//! Merges adjacent compatible blocks so the reconciler manages fewer nodes.

use super::block::{Block, BlockKind, ListKind};
use super::element::{Element, merge_elements};

/// Two passes: merge runs inside each block, then fold consecutive top-level
/// paragraphs sharing a quote level into one block.
pub(crate) fn coalesce_blocks(blocks: &[Block]) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks.iter().map(Block::merged) {
        match out.last_mut() {
            Some(prev) if can_fold(prev, &block) => {
                let mut elements = prev.elements().to_vec();
                elements.push(Element::paragraph_separator());
                elements.extend_from_slice(block.elements());
                *prev = prev.clone().with_elements(merge_elements(elements));
            }
            _ => out.push(block),
        }
    }
    out
}

fn can_fold(prev: &Block, next: &Block) -> bool {
    prev.kind() == BlockKind::Paragraph
        && next.kind() == BlockKind::Paragraph
        && prev.quote_level() == next.quote_level()
        && prev.list_kind() == ListKind::None
        && next.list_kind() == ListKind::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, ListMarker, Styling};
    use pretty_assertions::assert_eq;

    fn para(text: &str) -> Block {
        Block::paragraph(vec![Element::plain(text)])
    }

    #[test]
    fn folds_consecutive_paragraphs_at_same_quote_level() {
        let doc = Document::from_blocks(vec![
            para("one"),
            para("two"),
            para("quoted").with_quote_level(1),
            para("also quoted").with_quote_level(1),
        ]);

        let coalesced = doc.coalesce();
        let blocks = coalesced.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "one\n\ntwo");
        assert_eq!(blocks[1].plain_text(), "quoted\n\nalso quoted");
        assert_eq!(blocks[1].quote_level(), 1);
    }

    #[test]
    fn keeps_list_paragraphs_and_other_kinds_apart() {
        let doc = Document::from_blocks(vec![
            para("item").with_list(1, ListMarker::Bullet('-')),
            para("more").with_list(1, ListMarker::Continuation),
            Block::new(BlockKind::heading(2), vec![Element::plain("h")]),
            para("after heading"),
        ]);
        assert_eq!(doc.coalesce().len(), 4);
    }

    #[test]
    fn merges_runs_inside_blocks() {
        let doc = Document::from_blocks(vec![Block::paragraph(vec![
            Element::new("a", Styling::STRONG),
            Element::new("b", Styling::STRONG),
        ])]);
        let coalesced = doc.coalesce();
        assert_eq!(
            coalesced.blocks()[0].elements(),
            &[Element::new("ab", Styling::STRONG)]
        );
    }

    #[test]
    fn coalescing_is_idempotent() {
        let doc = Document::from_blocks(vec![para("a"), para("b"), Block::rule(), para("c")]);
        let once = doc.coalesce().into_owned();
        let twice = once.coalesce();
        assert!(matches!(twice, std::borrow::Cow::Borrowed(_)));
        assert_eq!(*twice, once);

        // A fresh document with the same blocks coalesces to itself as well.
        let fresh = Document::from_blocks(once.blocks().to_vec());
        assert_eq!(*fresh.coalesce(), once);
    }
}
