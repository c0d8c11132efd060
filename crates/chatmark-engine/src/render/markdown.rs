//! Canonical CommonMark writer.

use std::sync::OnceLock;

use regex::Regex;

use super::{TextBlocks, indent_code, link_runs};
use crate::models::{Align, Block, BlockKind, Element, Link, ListMarker, Styling, Table};
use crate::models::element::plain_text;

pub(crate) struct MarkdownWriter;

impl TextBlocks for MarkdownWriter {
    fn marker(&self, marker: ListMarker) -> String {
        match marker {
            ListMarker::Ordered(n) => format!("{n}. "),
            ListMarker::Bullet(bullet) => format!("{bullet} "),
            ListMarker::Continuation => String::new(),
        }
    }

    fn body(&self, block: &Block) -> String {
        match block.kind() {
            BlockKind::Paragraph => render_inline(block.elements()),
            BlockKind::Heading(level) => {
                let hashes = "#".repeat(level.into());
                let text = render_inline(block.elements()).replace('\n', " ");
                if text.is_empty() {
                    hashes
                } else {
                    format!("{hashes} {text}")
                }
            }
            BlockKind::Rule => "---".to_string(),
            BlockKind::FencedCode => fenced(&block.plain_text(), block.lang().unwrap_or("")),
            BlockKind::MathCode => fenced(&block.plain_text(), "math"),
            BlockKind::IndentedCode => indent_code(&block.plain_text()),
            BlockKind::Table => match block.table() {
                Some(table) => render_table(table),
                None => render_inline(block.elements()),
            },
        }
    }
}

fn fenced(code: &str, info: &str) -> String {
    let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
    format!("{fence}{info}\n{code}\n{fence}")
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn render_table(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.rows() + 1);
    for (r, row) in table.row_iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                render_inline(cell)
                    .replace('|', "\\|")
                    .replace("\\\n", " ")
                    .replace('\n', " ")
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
        if r == 0 {
            let aligns: Vec<&str> = table.aligns().iter().map(|a| align_marker(*a)).collect();
            lines.push(format!("| {} |", aligns.join(" | ")));
        }
    }
    lines.join("\n")
}

fn align_marker(align: Align) -> &'static str {
    match align {
        Align::Default => "---",
        Align::Left => ":--",
        Align::Center => ":-:",
        Align::Right => "--:",
    }
}

/// Styling flags with a markdown or inline-HTML marker, outermost first.
const MARKERS: [(Styling, &str, &str); 8] = [
    (Styling::STRONG, "**", "**"),
    (Styling::EMPHASIS, "*", "*"),
    (Styling::STRIKE, "~~", "~~"),
    (Styling::UNDERLINE, "<u>", "</u>"),
    (Styling::SUB, "<sub>", "</sub>"),
    (Styling::SUP, "<sup>", "</sup>"),
    (Styling::MARK, "<mark>", "</mark>"),
    (Styling::KEYWORD, "<kbd>", "</kbd>"),
];

fn markers_for(styling: Styling) -> Vec<usize> {
    (0..MARKERS.len())
        .filter(|&i| styling.contains(MARKERS[i].0))
        .collect()
}

/// Writes inline runs as CommonMark.
pub fn render_inline(elements: &[Element]) -> String {
    let mut writer = InlineWriter::default();
    for (link, run) in link_runs(elements) {
        match link {
            Some(link) => writer.link(link, run),
            None => run.iter().for_each(|e| writer.element(e)),
        }
    }
    writer.finish()
}

#[derive(Default)]
struct InlineWriter {
    out: String,
    /// Indices into [`MARKERS`] currently open, outermost first.
    open: Vec<usize>,
    /// Whitespace held back until the markers around it are settled.
    pending_ws: String,
}

impl InlineWriter {
    fn element(&mut self, element: &Element) {
        let styling = element.styling();
        let text = element.text();
        if styling.is_verbatim() {
            let core = verbatim(text, styling);
            self.core(&core, markers_for(styling));
            return;
        }
        let core = text.trim_matches(char::is_whitespace);
        if core.is_empty() {
            self.pending_ws.push_str(text);
            return;
        }
        let lead = &text[..text.len() - text.trim_start().len()];
        let trail = &text[text.trim_end().len()..];
        self.pending_ws.push_str(lead);
        let escaped = escape(core, self.at_line_start_after_pending());
        self.core(&escaped, markers_for(styling));
        self.pending_ws.push_str(trail);
    }

    fn link(&mut self, link: &Link, run: &[Element]) {
        let common: Vec<usize> = markers_for(run[0].styling())
            .into_iter()
            .filter(|&i| run.iter().all(|e| e.styling().contains(MARKERS[i].0)))
            .collect();
        let common_styling = common
            .iter()
            .fold(Styling::NONE, |acc, &i| acc | MARKERS[i].0);

        let text = plain_text(run);
        let uniform = run.iter().all(|e| e.styling() == common_styling);
        let rendered = if link.is_image {
            format!("![{}]({})", escape(&text, false), destination(link))
        } else if uniform && link.title.is_none() && text == link.uri {
            format!("<{}>", link.uri)
        } else {
            let inner: Vec<Element> = run
                .iter()
                .map(|e| Element::new(e.text(), e.styling().without(common_styling)))
                .collect();
            format!("[{}]({})", render_inline(&inner), destination(link))
        };
        self.core(&rendered, common);
    }

    fn at_line_start_after_pending(&self) -> bool {
        let ends_line = |s: &str| s.is_empty() || s.ends_with('\n');
        if self.pending_ws.is_empty() {
            ends_line(&self.out)
        } else {
            self.pending_ws.ends_with('\n')
        }
    }

    /// Settles markers for `wanted`, then writes already-escaped `core`.
    fn core(&mut self, core: &str, wanted: Vec<usize>) {
        let keep = self
            .open
            .iter()
            .zip(&wanted)
            .take_while(|(a, b)| a == b)
            .count();
        while self.open.len() > keep {
            if let Some(i) = self.open.pop() {
                self.out.push_str(MARKERS[i].2);
            }
        }
        let ws = std::mem::take(&mut self.pending_ws);
        push_breaks(&mut self.out, &ws);
        for &i in &wanted[keep..] {
            self.out.push_str(MARKERS[i].1);
        }
        self.open = wanted;
        push_breaks(&mut self.out, core);
    }

    fn finish(mut self) -> String {
        while let Some(i) = self.open.pop() {
            self.out.push_str(MARKERS[i].2);
        }
        let trailing = self.pending_ws.trim_end_matches('\n').to_string();
        self.out.push_str(&trailing);
        self.out
    }
}

/// Writes `text`, turning single newlines into hard breaks and keeping
/// paragraph separators as blank lines.
fn push_breaks(out: &mut String, text: &str) {
    for (i, part) in text.split(Element::PARAGRAPH_SEPARATOR).enumerate() {
        if i > 0 {
            out.push_str(Element::PARAGRAPH_SEPARATOR);
        }
        out.push_str(&part.replace('\n', "\\\n"));
    }
}

fn verbatim(text: &str, styling: Styling) -> String {
    if styling.contains(Styling::MATH) {
        return format!("${text}$");
    }
    let fence = "`".repeat(longest_run(text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if pad {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn destination(link: &Link) -> String {
    let uri = if link.uri.is_empty() || link.uri.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", link.uri.replace('<', "%3C").replace('>', "%3E"))
    } else {
        link.uri.clone()
    };
    match &link.title {
        Some(title) => format!("{uri} \"{}\"", title.replace('"', "\\\"")),
        None => uri,
    }
}

const ESCAPED: [char; 9] = ['\\', '*', '_', '`', '[', ']', '<', '$', '~'];

/// Named or numeric character reference at the start of the input.
fn entity_regex() -> &'static Regex {
    static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
            .expect("Invalid entity regex")
    })
}

/// Backslash-escapes markdown punctuation and block openers at line starts.
fn escape(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut chars = line.char_indices().peekable();
        if at_line_start || i > 0 {
            escape_line_start(line, &mut out, &mut chars);
        }
        for (idx, c) in chars {
            if ESCAPED.contains(&c) || (c == '&' && entity_regex().is_match(&line[idx..])) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

fn escape_line_start(
    line: &str,
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) {
    match line.chars().next() {
        Some('#' | '>' | '+' | '-' | '=') => {
            out.push('\\');
        }
        Some(c) if c.is_ascii_digit() => {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            if matches!(line[digits..].chars().next(), Some('.' | ')')) {
                for _ in 0..digits {
                    if let Some((_, d)) = chars.next() {
                        out.push(d);
                    }
                }
                out.push('\\');
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![Element::plain("plain")], "plain")]
    #[case(vec![Element::new("em", Styling::EMPHASIS)], "*em*")]
    #[case(vec![Element::new("x", Styling::STRONG | Styling::EMPHASIS)], "***x***")]
    #[case(vec![Element::new("gone", Styling::STRIKE)], "~~gone~~")]
    #[case(vec![Element::new("a`b", Styling::CODE)], "``a`b``")]
    #[case(vec![Element::new("`x", Styling::MONO)], "`` `x ``")]
    #[case(vec![Element::new("x^2", Styling::MATH)], "$x^2$")]
    #[case(vec![Element::new("u", Styling::UNDERLINE)], "<u>u</u>")]
    #[case(vec![Element::new("k", Styling::KEYWORD)], "<kbd>k</kbd>")]
    #[case(vec![Element::new("g", Styling::GRAYED)], "g")]
    #[case(vec![Element::plain("a*b_c")], "a\\*b\\_c")]
    #[case(vec![Element::plain("a &amp; b & c")], "a \\&amp; b & c")]
    #[case(vec![Element::plain("&#35; &x;")], "\\&#35; \\&x;")]
    #[case(vec![Element::plain("# not a heading")], "\\# not a heading")]
    #[case(vec![Element::plain("1. not a list")], "1\\. not a list")]
    #[case(vec![Element::plain("line\nbreak")], "line\\\nbreak")]
    #[case(vec![Element::plain("one\n\ntwo")], "one\n\ntwo")]
    fn renders_inline(#[case] elements: Vec<Element>, #[case] expected: &str) {
        assert_eq!(render_inline(&elements), expected);
    }

    #[test]
    fn whitespace_moves_outside_markers() {
        let elements = vec![
            Element::plain("a"),
            Element::new(" bold ", Styling::STRONG),
            Element::plain("b"),
        ];
        assert_eq!(render_inline(&elements), "a **bold** b");
    }

    #[test]
    fn shares_outer_markers_across_runs() {
        let elements = vec![
            Element::new("bold ", Styling::STRONG),
            Element::new("both", Styling::STRONG | Styling::EMPHASIS),
        ];
        assert_eq!(render_inline(&elements), "**bold *both***");
    }

    #[rstest]
    #[case(Link::new("https://x.example"), "x", "[x](https://x.example)")]
    #[case(Link::new("https://x.example").with_title("T"), "x", "[x](https://x.example \"T\")")]
    #[case(Link::new("https://x.example"), "https://x.example", "<https://x.example>")]
    #[case(Link::image("i.png"), "alt", "![alt](i.png)")]
    #[case(Link::new("a b"), "x", "[x](<a b>)")]
    fn renders_links(#[case] link: Link, #[case] text: &str, #[case] expected: &str) {
        let elements = vec![Element::plain(text).with_link(Some(link))];
        assert_eq!(render_inline(&elements), expected);
    }

    #[test]
    fn styled_link_text() {
        let link = Some(Link::new("u"));
        let elements = vec![
            Element::new("a", Styling::STRONG).with_link(link.clone()),
            Element::new("b", Styling::STRONG | Styling::EMPHASIS).with_link(link),
        ];
        assert_eq!(render_inline(&elements), "**[a*b*](u)**");
    }

    #[test]
    fn fences_grow_past_backtick_runs() {
        assert_eq!(fenced("a ```` b", "x"), "`````x\na ```` b\n`````");
        assert_eq!(fenced("plain", ""), "```\nplain\n```");
    }

    #[test]
    fn table_with_alignment_row() {
        let table = Table::new(
            vec![Align::Default, Align::Left, Align::Center, Align::Right],
            vec![
                vec![
                    vec![Element::plain("A")],
                    vec![Element::plain("B")],
                    vec![Element::plain("C")],
                    vec![Element::plain("D")],
                ],
                vec![vec![Element::plain("a|b")]],
            ],
        );
        assert_eq!(
            render_table(&table),
            "| A | B | C | D |\n| --- | :-- | :-: | --: |\n| a\\|b |  |  |  |"
        );
    }
}
