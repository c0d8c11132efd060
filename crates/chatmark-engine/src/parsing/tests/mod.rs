//! Integration tests for the parsing module.
//!
//! Uses snapshot testing with YAML format for readability.
//! Fixtures (.md) and snapshots (.snap) are co-located in `fixtures/`.

mod invariants;

use crate::models::{BlockKind, ListKind};
use crate::parsing::{ParseOptions, parse_markdown};

// Fixture-based snapshot tests

#[test]
fn fixture_nested_lists() {
    assert_fixture("nested_lists");
}

#[test]
fn fixture_quotes_and_code() {
    assert_fixture("quotes_and_code");
}

#[test]
fn fixture_inline_styles() {
    assert_fixture("inline_styles");
}

fn assert_fixture(name: &str) {
    let fixtures_dir = format!("{}/src/parsing/tests/fixtures", env!("CARGO_MANIFEST_DIR"));
    let md = std::fs::read_to_string(format!("{fixtures_dir}/{name}.md")).unwrap();

    let blocks = parse_markdown(&md, &ParseOptions::default());
    invariants::check(&blocks);

    let snap = normalize::normalize(&blocks);
    insta::with_settings!({
        snapshot_path => fixtures_dir.as_str(),
        prepend_module_to_snapshot => false,
    }, {
        insta::assert_yaml_snapshot!(name, snap);
    });
}

// Invariant tests

/// Every parse, including partial input, satisfies the nesting invariants.
#[test]
fn streamed_prefixes_keep_invariants() {
    let md = "> quote\n> - a\n>   1. b\n\n- c\n  more\n\n  - d\n\n| x | y |\n|---|---|\n| 1 | 2 |\n";
    let chunking = ParseOptions {
        chunking: true,
        ..ParseOptions::default()
    };
    for end in (0..=md.len()).filter(|i| md.is_char_boundary(*i)) {
        invariants::check(&parse_markdown(&md[..end], &chunking));
        invariants::check(&parse_markdown(&md[..end], &ParseOptions::default()));
    }
}

/// Test that code spans don't produce links.
#[test]
fn code_spans_suppress_link_detection() {
    let blocks = parse_markdown("`https://example.com`", &ParseOptions::default());
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].elements().iter().all(|e| e.link().is_none()));
}

/// Test unclosed constructs become plain text.
#[test]
fn unclosed_constructs_become_text() {
    let blocks = parse_markdown("**unclosed and `also unclosed", &ParseOptions::default());
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].elements().len(), 1);
    assert_eq!(blocks[0].plain_text(), "**unclosed and `also unclosed");
}

/// Test empty document produces no blocks.
#[test]
fn empty_document() {
    assert!(parse_markdown("", &ParseOptions::default()).is_empty());
}

/// Test blank lines don't produce blocks.
#[test]
fn blank_lines_only() {
    assert!(parse_markdown("\n\n\n", &ParseOptions::default()).is_empty());
}

/// Test a just-typed marker survives while chunking.
#[test]
fn just_typed_marker_survives_chunking() {
    let chunking = ParseOptions {
        chunking: true,
        ..ParseOptions::default()
    };
    let blocks = parse_markdown("1. ", &chunking);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind(), BlockKind::Paragraph);
    assert_eq!(blocks[0].list_kind(), ListKind::Ordered);
}
