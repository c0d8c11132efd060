// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "## Section\n\nParagraph with **bold**, *italic* and `code`, see https://example.com.\n\n- Bullet point\n  - Nested item\n- Another item\n\n> Quoted text\n> > nested quote\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n";
    base.repeat(size)
}

/// Prefixes of `text` cut every `step` bytes, as a streamed reply grows.
#[allow(dead_code)]
pub fn stream_prefixes(text: &str, step: usize) -> Vec<&str> {
    let mut prefixes = Vec::new();
    let mut end = 0;
    while end < text.len() {
        end = (end + step).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        prefixes.push(&text[..end]);
    }
    prefixes
}
