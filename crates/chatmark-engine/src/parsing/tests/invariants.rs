use crate::models::{Block, ListKind, MAX_LIST_LEVEL, MAX_QUOTE_LEVEL};

/// Validates normalizer output invariants.
///
/// Asserts that:
/// - Quote and list levels stay within their maximums
/// - A block never carries both an order and a bullet
/// - Level 0 blocks carry no list marker
/// - Every continuation follows a block of the same list at the same level
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check(blocks: &[Block]) {
    for (i, b) in blocks.iter().enumerate() {
        assert!(
            b.quote_level() <= MAX_QUOTE_LEVEL && b.list_level() <= MAX_LIST_LEVEL,
            "block {i} exceeds nesting limits: {:?}",
            b.nesting()
        );
        assert!(
            !(b.list_order() > 0 && b.list_bullet().is_some()),
            "block {i} has both order and bullet: {b:?}"
        );
        if b.list_level() == 0 {
            assert!(
                b.list_order() == 0 && b.list_bullet().is_none(),
                "block {i} at list level 0 carries a marker: {b:?}"
            );
        }
        if b.list_kind() == ListKind::Continuation {
            let headed = blocks[..i]
                .iter()
                .rev()
                .take_while(|prev| prev.list_level() >= b.list_level())
                .any(|prev| prev.list_level() == b.list_level() && prev.is_list_head());
            assert!(headed, "continuation block {i} has no preceding head: {b:?}");
        }
    }
}
