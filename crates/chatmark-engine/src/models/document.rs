use std::borrow::Cow;

use crate::parsing::{self, ParseOptions};
use crate::render::{self, OutputFormat};

use super::block::Block;
use super::coalesce;

/// An ordered sequence of blocks: one parsed chat message.
///
/// Equality only looks at the blocks, not at how the document was produced.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    coalesced: bool,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Eq for Document {}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            coalesced: false,
        }
    }

    /// Parses markdown text into a fresh document.
    pub fn parse(text: &str, options: &ParseOptions) -> Self {
        Self::from_blocks(parsing::parse_markdown(text, options))
    }

    /// Replaces every block with the result of parsing `text`.
    pub fn update(&mut self, text: &str, options: &ParseOptions) {
        self.blocks = parsing::parse_markdown(text, options);
        self.coalesced = false;
    }

    pub fn append(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
        self.coalesced = false;
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.coalesced = false;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn is_coalesced(&self) -> bool {
        self.coalesced
    }

    /// Derived document with fewer, larger blocks. Borrows `self` when it is
    /// already the product of coalescing.
    pub fn coalesce(&self) -> Cow<'_, Document> {
        if self.coalesced {
            return Cow::Borrowed(self);
        }
        Cow::Owned(Document {
            blocks: coalesce::coalesce_blocks(&self.blocks),
            coalesced: true,
        })
    }

    pub fn to_string(&self, format: OutputFormat) -> String {
        render::render_blocks(&self.blocks, format)
    }
}
