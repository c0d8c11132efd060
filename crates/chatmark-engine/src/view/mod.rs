//! Reconciles successive block sequences against a cached presentation tree.
//!
//! Each call walks the cached root nodes in order and offers them the new
//! sequence. Nodes that report [`ConsumeResult::Incompatible`] are dropped
//! along with everything after them, and the rest of the sequence is built
//! fresh. Appending text to the last block therefore only touches the final
//! leaf.

pub mod layout;
pub mod node;
pub mod track;

pub use layout::LayoutHints;
pub use node::{CodeState, ConsumeResult, LeafKind, LeafNode, LevelNode, Node, NodeId, WrapMode};
pub use track::TrackRange;

use crate::models::{Block, Document};
use crate::render::{self, OutputFormat};
use node::BuildContext;

/// Summary of one reconcile pass, counted in root nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub result: ConsumeResult,
    pub reused: usize,
    pub changed: usize,
    pub rebuilt: usize,
    pub removed: usize,
}

impl Default for ReconcileReport {
    fn default() -> Self {
        Self {
            result: ConsumeResult::NoChange,
            reused: 0,
            changed: 0,
            rebuilt: 0,
            removed: 0,
        }
    }
}

/// Owner of the presentation tree. Lives on the UI side; not shared.
#[derive(Debug, Default)]
pub struct Reconciler {
    nodes: Vec<Node>,
    cx: BuildContext,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn reconcile_document(&mut self, document: &Document) -> ReconcileReport {
        self.reconcile(document.blocks())
    }

    pub fn reconcile(&mut self, blocks: &[Block]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut cursor = 0;
        let mut kept = 0;
        // Highest track key among kept nodes; keys must rise in display order.
        let mut last_key = 0;

        for node in &mut self.nodes {
            let start = cursor;
            let result = node.consume(blocks, &mut cursor, &mut self.cx);
            if result == ConsumeResult::Incompatible {
                break;
            }
            let track = node.track();
            if !track.is_none() && track.start <= last_key {
                // A level before this node absorbed blocks with fresher keys.
                log::debug!("rebuilding from node {:?}: track keys out of order", node.id());
                cursor = start;
                break;
            }
            last_key = last_key.max(track.end);
            match result {
                ConsumeResult::Changed => report.changed += 1,
                _ => report.reused += 1,
            }
            kept += 1;
        }
        report.removed = self.nodes.len() - kept;
        self.nodes.truncate(kept);

        while cursor < blocks.len() {
            self.nodes.push(Node::build(blocks, &mut cursor, &mut self.cx));
            report.rebuilt += 1;
        }

        if report.changed + report.rebuilt + report.removed > 0 {
            report.result = ConsumeResult::Changed;
        }
        log::debug!(
            "reconciled {} blocks: reused={} changed={} rebuilt={} removed={}",
            blocks.len(),
            report.reused,
            report.changed,
            report.rebuilt,
            report.removed
        );
        report
    }

    /// Blocks of every leaf in display order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.nodes
            .iter()
            .flat_map(|node| node.leaves())
            .map(LeafNode::block)
    }

    pub fn find_leaf(&self, id: NodeId) -> Option<&LeafNode> {
        self.nodes
            .iter()
            .flat_map(|node| node.leaves())
            .find(|leaf| leaf.id() == id)
    }

    pub fn find_leaf_mut(&mut self, id: NodeId) -> Option<&mut LeafNode> {
        self.nodes
            .iter_mut()
            .flat_map(|node| node.leaves_mut())
            .find(|leaf| leaf.id() == id)
    }

    /// Text of the leaves whose track keys intersect `range`.
    pub fn text_for_range(&self, range: TrackRange, format: OutputFormat) -> String {
        let blocks: Vec<Block> = self
            .nodes
            .iter()
            .flat_map(|node| node.leaves())
            .filter(|leaf| leaf.track().intersects(range))
            .map(|leaf| leaf.block().clone())
            .collect();
        render::render_blocks(&blocks, format)
    }

    pub fn select_all_text(&self, format: OutputFormat) -> String {
        let blocks: Vec<Block> = self.blocks().cloned().collect();
        render::render_blocks(&blocks, format)
    }
}
