//! Presentation nodes cached by the reconciler.

use super::layout::LayoutHints;
use super::track::{TrackAllocator, TrackRange};
use crate::models::{Block, BlockKind};

/// Outcome of offering a block sequence to a cached node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumeResult {
    Changed,
    NoChange,
    Incompatible,
}

/// Identity of a node, stable for as long as the node is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Allocation state shared by every node one reconciler builds.
#[derive(Debug, Default)]
pub(crate) struct BuildContext {
    next_id: u64,
    pub(crate) keys: TrackAllocator,
}

impl BuildContext {
    fn node_id(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    Wrap,
    #[default]
    NoWrap,
}

/// Code leaf sub-state owned by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeState {
    language: Option<String>,
    wrap: WrapMode,
    /// Horizontal scroll offset in columns.
    scroll: u32,
}

impl CodeState {
    fn new(block: &Block) -> Self {
        Self {
            language: language_label(block),
            wrap: WrapMode::default(),
            scroll: 0,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn scroll(&self) -> u32 {
        self.scroll
    }
}

fn language_label(block: &Block) -> Option<String> {
    match block.kind() {
        BlockKind::FencedCode => block.lang().map(str::to_string),
        BlockKind::MathCode => Some("math".to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafKind {
    /// Paragraphs, headings and tables.
    Text,
    Code(CodeState),
    Rule,
}

impl LeafKind {
    fn for_block(block: &Block) -> Self {
        match block.kind() {
            BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::Table => LeafKind::Text,
            BlockKind::FencedCode | BlockKind::IndentedCode | BlockKind::MathCode => {
                LeafKind::Code(CodeState::new(block))
            }
            BlockKind::Rule => LeafKind::Rule,
        }
    }
}

/// Track keys a block needs: one per element, at least one for text and
/// code, none for rules.
fn key_count(block: &Block) -> u64 {
    match block.kind() {
        BlockKind::Rule => 0,
        _ => block.elements().len().max(1) as u64,
    }
}

/// Wraps exactly one block.
#[derive(Debug, Clone)]
pub struct LeafNode {
    id: NodeId,
    block: Block,
    kind: LeafKind,
    layout: LayoutHints,
    track: TrackRange,
    last: ConsumeResult,
}

impl LeafNode {
    pub(crate) fn build(block: &Block, cx: &mut BuildContext) -> Self {
        Self {
            id: cx.node_id(),
            block: block.clone(),
            kind: LeafKind::for_block(block),
            layout: LayoutHints::for_block(block),
            track: cx.keys.allocate(key_count(block)),
            last: ConsumeResult::Changed,
        }
    }

    /// Same kind and nesting as the cached block.
    pub fn is_compatible(&self, block: &Block) -> bool {
        self.block.kind() == block.kind() && self.block.nesting() == block.nesting()
    }

    /// Compatible, and the block's track keys fit in the range this leaf
    /// already holds. A leaf never takes fresh keys in place, since they
    /// would sort after its later siblings.
    pub fn accepts(&self, block: &Block) -> bool {
        self.is_compatible(block) && key_count(block) <= self.track.len()
    }

    pub(crate) fn consume(&mut self, blocks: &[Block], cursor: &mut usize) -> ConsumeResult {
        let Some(block) = blocks.get(*cursor) else {
            self.last = ConsumeResult::Incompatible;
            return self.last;
        };
        if !self.accepts(block) {
            self.last = ConsumeResult::Incompatible;
            return self.last;
        }
        *cursor += 1;
        if *block == self.block {
            self.last = ConsumeResult::NoChange;
            return self.last;
        }

        let count = key_count(block);
        self.track = if count == 0 {
            TrackRange::NONE
        } else {
            TrackRange::new(self.track.start, self.track.start + count - 1)
        };
        self.block = block.clone();
        self.layout = LayoutHints::for_block(block);
        if let LeafKind::Code(state) = &mut self.kind {
            state.language = language_label(block);
        }
        self.last = ConsumeResult::Changed;
        self.last
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn kind(&self) -> &LeafKind {
        &self.kind
    }

    pub fn layout(&self) -> &LayoutHints {
        &self.layout
    }

    pub fn track(&self) -> TrackRange {
        self.track
    }

    pub fn last_result(&self) -> ConsumeResult {
        self.last
    }

    pub fn code_state(&self) -> Option<&CodeState> {
        match &self.kind {
            LeafKind::Code(state) => Some(state),
            _ => None,
        }
    }

    /// Flips code wrapping. Returns the new mode, or `None` for non-code leaves.
    pub fn toggle_wrap(&mut self) -> Option<WrapMode> {
        let LeafKind::Code(state) = &mut self.kind else {
            return None;
        };
        state.wrap = match state.wrap {
            WrapMode::Wrap => WrapMode::NoWrap,
            WrapMode::NoWrap => WrapMode::Wrap,
        };
        Some(state.wrap)
    }

    /// Sets the code scroll offset. Returns false for non-code leaves.
    pub fn scroll_to(&mut self, offset: u32) -> bool {
        match &mut self.kind {
            LeafKind::Code(state) => {
                state.scroll = offset;
                true
            }
            _ => false,
        }
    }
}

/// A contiguous run of blocks sharing one nested `(quote, list)` signature.
#[derive(Debug, Clone)]
pub struct LevelNode {
    id: NodeId,
    quote_level: u8,
    list_level: u8,
    children: Vec<LeafNode>,
    last: ConsumeResult,
}

impl LevelNode {
    /// Builds a level from `blocks[*cursor]` and greedily takes every
    /// following block with the same signature.
    pub(crate) fn build(blocks: &[Block], cursor: &mut usize, cx: &mut BuildContext) -> Self {
        let (quote_level, list_level) = blocks[*cursor].nesting();
        let mut level = Self {
            id: cx.node_id(),
            quote_level,
            list_level,
            children: Vec::new(),
            last: ConsumeResult::Changed,
        };
        level.absorb(blocks, cursor, cx);
        level
    }

    fn absorb(&mut self, blocks: &[Block], cursor: &mut usize, cx: &mut BuildContext) -> bool {
        let mut grew = false;
        while let Some(block) = blocks.get(*cursor)
            && self.is_compatible(block)
        {
            self.children.push(LeafNode::build(block, cx));
            *cursor += 1;
            grew = true;
        }
        grew
    }

    pub fn is_compatible(&self, block: &Block) -> bool {
        block.nesting() == (self.quote_level, self.list_level)
    }

    pub(crate) fn consume(
        &mut self,
        blocks: &[Block],
        cursor: &mut usize,
        cx: &mut BuildContext,
    ) -> ConsumeResult {
        let start = *cursor;
        let fits = blocks.len().saturating_sub(start) >= self.children.len()
            && self
                .children
                .iter()
                .zip(&blocks[start.min(blocks.len())..])
                .all(|(child, block)| child.accepts(block));
        if !fits {
            self.last = ConsumeResult::Incompatible;
            return self.last;
        }

        let mut result = ConsumeResult::NoChange;
        for child in &mut self.children {
            match child.consume(blocks, cursor) {
                ConsumeResult::Changed => result = ConsumeResult::Changed,
                ConsumeResult::NoChange => {}
                ConsumeResult::Incompatible => {
                    debug_assert!(false, "child of {:?} incompatible after precheck", self.id);
                    log::error!("child of level {:?} incompatible after precheck", self.id);
                    *cursor = start;
                    self.last = ConsumeResult::Incompatible;
                    return self.last;
                }
            }
        }
        if self.absorb(blocks, cursor, cx) {
            result = ConsumeResult::Changed;
        }
        self.last = result;
        result
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn quote_level(&self) -> u8 {
        self.quote_level
    }

    pub fn list_level(&self) -> u8 {
        self.list_level
    }

    pub fn children(&self) -> &[LeafNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [LeafNode] {
        &mut self.children
    }

    /// Min/max over children that have keys.
    pub fn track(&self) -> TrackRange {
        self.children
            .iter()
            .fold(TrackRange::NONE, |acc, child| acc.union(child.track()))
    }

    pub fn last_result(&self) -> ConsumeResult {
        self.last
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafNode),
    Level(LevelNode),
}

impl Node {
    /// Builds the node for `blocks[*cursor]`: a level for nested blocks,
    /// otherwise the leaf matching the block kind.
    pub(crate) fn build(blocks: &[Block], cursor: &mut usize, cx: &mut BuildContext) -> Node {
        let block = &blocks[*cursor];
        if block.is_nested() {
            Node::Level(LevelNode::build(blocks, cursor, cx))
        } else {
            *cursor += 1;
            Node::Leaf(LeafNode::build(block, cx))
        }
    }

    pub(crate) fn consume(
        &mut self,
        blocks: &[Block],
        cursor: &mut usize,
        cx: &mut BuildContext,
    ) -> ConsumeResult {
        match self {
            Node::Leaf(leaf) => leaf.consume(blocks, cursor),
            Node::Level(level) => level.consume(blocks, cursor, cx),
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Leaf(leaf) => leaf.id(),
            Node::Level(level) => level.id(),
        }
    }

    pub fn track(&self) -> TrackRange {
        match self {
            Node::Leaf(leaf) => leaf.track(),
            Node::Level(level) => level.track(),
        }
    }

    pub fn last_result(&self) -> ConsumeResult {
        match self {
            Node::Leaf(leaf) => leaf.last_result(),
            Node::Level(level) => level.last_result(),
        }
    }

    /// Leaves in display order.
    pub fn leaves(&self) -> &[LeafNode] {
        match self {
            Node::Leaf(leaf) => std::slice::from_ref(leaf),
            Node::Level(level) => level.children(),
        }
    }

    pub fn leaves_mut(&mut self) -> &mut [LeafNode] {
        match self {
            Node::Leaf(leaf) => std::slice::from_mut(leaf),
            Node::Level(level) => level.children_mut(),
        }
    }
}
