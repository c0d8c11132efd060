//! HTML writer. One block-level tag per line; quotes and lists nest real
//! elements rather than prefixes.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::link_runs;
use crate::models::element::plain_text;
use crate::models::{Align, Block, BlockKind, Element, Link, Styling, Table};

/// Inline tags in nesting order, outermost first.
const TAGS: [(Styling, &str, &str); 11] = [
    (Styling::STRONG, "<strong>", "</strong>"),
    (Styling::EMPHASIS, "<em>", "</em>"),
    (Styling::STRIKE, "<del>", "</del>"),
    (Styling::UNDERLINE, "<u>", "</u>"),
    (Styling::SUB, "<sub>", "</sub>"),
    (Styling::SUP, "<sup>", "</sup>"),
    (Styling::MARK, "<mark>", "</mark>"),
    (Styling::KEYWORD, "<kbd>", "</kbd>"),
    (Styling::GRAYED, "<span class=\"grayed\">", "</span>"),
    (Styling::MATH, "<span class=\"math\">", "</span>"),
    (Styling::CODE, "<code>", "</code>"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListTag {
    Unordered,
    Ordered,
}

impl ListTag {
    fn close(self) -> &'static str {
        match self {
            ListTag::Unordered => "</ul>",
            ListTag::Ordered => "</ol>",
        }
    }
}

#[derive(Default)]
struct HtmlWriter {
    lines: Vec<String>,
    quote_level: u8,
    /// One entry per open list level, each with an open `<li>`.
    lists: Vec<ListTag>,
}

impl HtmlWriter {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn close_lists_to(&mut self, depth: usize) {
        while self.lists.len() > depth {
            if let Some(tag) = self.lists.pop() {
                self.push("</li>");
                self.push(tag.close());
            }
        }
    }

    fn set_quote_level(&mut self, level: u8) {
        if level == self.quote_level {
            return;
        }
        self.close_lists_to(0);
        while self.quote_level < level {
            self.push("<blockquote>");
            self.quote_level += 1;
        }
        while self.quote_level > level {
            self.push("</blockquote>");
            self.quote_level -= 1;
        }
    }

    /// Opens implicit `<ul><li>` wrappers until `depth` levels are open.
    fn open_implicit_to(&mut self, depth: usize) {
        while self.lists.len() < depth {
            self.push("<ul>");
            self.push("<li>");
            self.lists.push(ListTag::Unordered);
        }
    }

    fn place(&mut self, block: &Block) {
        self.set_quote_level(block.quote_level());
        let level = usize::from(block.list_level());
        self.close_lists_to(level);

        if !block.is_list_head() {
            self.open_implicit_to(level);
            return;
        }
        let tag = if block.list_order() > 0 {
            ListTag::Ordered
        } else {
            ListTag::Unordered
        };
        if self.lists.len() == level {
            if self.lists.last() == Some(&tag) {
                self.push("</li>");
            } else {
                self.close_lists_to(level - 1);
            }
        }
        self.open_implicit_to(level - 1);
        if self.lists.len() < level {
            let open = match (tag, block.list_order()) {
                (ListTag::Ordered, 1) => "<ol>".to_string(),
                (ListTag::Ordered, n) => format!("<ol start=\"{n}\">"),
                (ListTag::Unordered, _) => "<ul>".to_string(),
            };
            self.push(open);
            self.lists.push(tag);
        }
        self.push("<li>");
    }

    fn block(&mut self, block: &Block) {
        self.place(block);
        match block.kind() {
            BlockKind::Paragraph => {
                for paragraph in split_paragraphs(block.elements()) {
                    let line = format!("<p>{}</p>", render_inline(&paragraph));
                    self.push(line);
                }
            }
            BlockKind::Heading(level) => {
                let line = format!("<h{level}>{}</h{level}>", render_inline(block.elements()));
                self.push(line);
            }
            BlockKind::Rule => self.push("<hr>"),
            BlockKind::FencedCode => {
                let code = encode_text(&block.plain_text()).into_owned();
                let line = match block.lang() {
                    Some(lang) => format!(
                        "<pre><code class=\"language-{}\">{code}</code></pre>",
                        encode_double_quoted_attribute(lang)
                    ),
                    None => format!("<pre><code>{code}</code></pre>"),
                };
                self.push(line);
            }
            BlockKind::IndentedCode => {
                let line = format!("<pre><code>{}</code></pre>", encode_text(&block.plain_text()));
                self.push(line);
            }
            BlockKind::MathCode => {
                let line = format!(
                    "<pre class=\"math\"><code>{}</code></pre>",
                    encode_text(&block.plain_text())
                );
                self.push(line);
            }
            BlockKind::Table => match block.table() {
                Some(table) => self.table(table),
                None => {
                    let line = format!("<pre>{}</pre>", encode_text(&block.plain_text()));
                    self.push(line);
                }
            },
        }
    }

    fn table(&mut self, table: &Table) {
        self.push("<table>");
        for (r, row) in table.row_iter().enumerate() {
            if r == 0 {
                self.push("<thead>");
                self.push("<tr style=\"border-bottom: 1px solid\">");
            } else {
                if r == 1 {
                    self.push("<tbody>");
                }
                self.push("<tr>");
            }
            let cell_tag = if r == 0 { "th" } else { "td" };
            for (cell, align) in row.iter().zip(table.aligns()) {
                let style = match align {
                    Align::Default => String::new(),
                    Align::Left => " style=\"text-align: left\"".to_string(),
                    Align::Center => " style=\"text-align: center\"".to_string(),
                    Align::Right => " style=\"text-align: right\"".to_string(),
                };
                let line = format!("<{cell_tag}{style}>{}</{cell_tag}>", render_inline(cell));
                self.push(line);
            }
            self.push("</tr>");
            if r == 0 {
                self.push("</thead>");
            }
        }
        if table.rows() > 1 {
            self.push("</tbody>");
        }
        self.push("</table>");
    }

    fn finish(mut self) -> String {
        self.close_lists_to(0);
        self.set_quote_level(0);
        self.lines.join("\n")
    }
}

/// Splits runs at coalesced paragraph separators, dropping empty paragraphs.
fn split_paragraphs(elements: &[Element]) -> Vec<Vec<Element>> {
    let mut paragraphs = vec![Vec::new()];
    for element in elements {
        for (i, piece) in element.text().split(Element::PARAGRAPH_SEPARATOR).enumerate() {
            if i > 0 {
                paragraphs.push(Vec::new());
            }
            if !piece.is_empty()
                && let Some(current) = paragraphs.last_mut()
            {
                let run = Element::new(piece, element.styling()).with_link(element.link().cloned());
                current.push(run);
            }
        }
    }
    paragraphs.retain(|p| !p.is_empty());
    paragraphs
}

pub fn render_blocks(blocks: &[Block]) -> String {
    let mut writer = HtmlWriter::default();
    for block in blocks {
        writer.block(block);
    }
    writer.finish()
}

/// Inline runs as HTML; each run opens and closes its own tags.
pub fn render_inline(elements: &[Element]) -> String {
    let mut out = String::new();
    for (link, run) in link_runs(elements) {
        match link {
            Some(link) if link.is_image => out.push_str(&image(link, run)),
            Some(link) => {
                out.push_str(&anchor_open(link));
                run.iter().for_each(|e| styled(&mut out, e));
                out.push_str("</a>");
            }
            None => run.iter().for_each(|e| styled(&mut out, e)),
        }
    }
    out
}

fn styled(out: &mut String, element: &Element) {
    let styling = element.styling();
    let tags: Vec<_> = TAGS
        .iter()
        .filter(|(flag, ..)| match *flag {
            // monospace runs share the code tag
            Styling::CODE => styling.intersects(Styling::CODE | Styling::MONO),
            flag => styling.contains(flag),
        })
        .collect();
    for (_, open, _) in &tags {
        out.push_str(open);
    }
    let text = encode_text(element.text());
    out.push_str(&text.replace('\n', "<br>"));
    for (_, _, close) in tags.iter().rev() {
        out.push_str(close);
    }
}

fn anchor_open(link: &Link) -> String {
    let href = encode_double_quoted_attribute(&link.uri);
    match &link.title {
        Some(title) => format!(
            "<a href=\"{href}\" title=\"{}\">",
            encode_double_quoted_attribute(title)
        ),
        None => format!("<a href=\"{href}\">"),
    }
}

fn image(link: &Link, run: &[Element]) -> String {
    let src = encode_double_quoted_attribute(&link.uri);
    let alt = plain_text(run);
    let alt = encode_double_quoted_attribute(&alt);
    match &link.title {
        Some(title) => format!(
            "<img src=\"{src}\" alt=\"{alt}\" title=\"{}\">",
            encode_double_quoted_attribute(title)
        ),
        None => format!("<img src=\"{src}\" alt=\"{alt}\">"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListMarker;
    use pretty_assertions::assert_eq;

    fn para(text: &str) -> Block {
        Block::paragraph(vec![Element::plain(text)])
    }

    #[test]
    fn escapes_text_and_styles_runs() {
        let elements = vec![
            Element::plain("a < b & "),
            Element::new("c", Styling::STRONG | Styling::EMPHASIS),
            Element::new("m", Styling::MONO),
            Element::plain("\nx"),
        ];
        assert_eq!(
            render_inline(&elements),
            "a &lt; b &amp; <strong><em>c</em></strong><code>m</code><br>x"
        );
    }

    #[test]
    fn coalesced_paragraphs_stay_separate() {
        let doc = crate::models::Document::from_blocks(vec![
            Block::paragraph(vec![Element::plain("para "), Element::new("one", Styling::STRONG)]),
            para("para two"),
        ]);
        let coalesced = doc.coalesce();
        assert_eq!(coalesced.len(), 1);
        assert_eq!(
            render_blocks(coalesced.blocks()),
            "<p>para <strong>one</strong></p>\n<p>para two</p>"
        );
    }

    #[test]
    fn links_and_images() {
        let elements = vec![
            Element::plain("go").with_link(Some(Link::new("https://x.example?a=1&b=2").with_title("T"))),
            Element::plain("pic").with_link(Some(Link::image("p.png"))),
        ];
        assert_eq!(
            render_inline(&elements),
            "<a href=\"https://x.example?a=1&amp;b=2\" title=\"T\">go</a><img src=\"p.png\" alt=\"pic\">"
        );
    }

    #[test]
    fn nested_quotes() {
        let html = render_blocks(&[para("Body1").with_quote_level(1), para("Body2").with_quote_level(2)]);
        assert_eq!(
            html,
            "<blockquote>\n<p>Body1</p>\n<blockquote>\n<p>Body2</p>\n</blockquote>\n</blockquote>"
        );
    }

    #[test]
    fn ordered_list_with_start_and_nested_bullets() {
        let html = render_blocks(&[
            para("three").with_list(1, ListMarker::Ordered(3)),
            para("inner").with_list(2, ListMarker::Bullet('-')),
            para("four").with_list(1, ListMarker::Ordered(4)),
            para("more").with_list(1, ListMarker::Continuation),
        ]);
        assert_eq!(
            html,
            [
                "<ol start=\"3\">",
                "<li>",
                "<p>three</p>",
                "<ul>",
                "<li>",
                "<p>inner</p>",
                "</li>",
                "</ul>",
                "</li>",
                "<li>",
                "<p>four</p>",
                "<p>more</p>",
                "</li>",
                "</ol>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn switching_list_kind_at_same_level_starts_new_list() {
        let html = render_blocks(&[
            para("a").with_list(1, ListMarker::Bullet('-')),
            para("b").with_list(1, ListMarker::Ordered(1)),
        ]);
        assert_eq!(
            html,
            "<ul>\n<li>\n<p>a</p>\n</li>\n</ul>\n<ol>\n<li>\n<p>b</p>\n</li>\n</ol>"
        );
    }

    #[test]
    fn skipped_levels_get_implicit_wrappers() {
        let html = render_blocks(&[para("deep").with_list(2, ListMarker::Bullet('-'))]);
        assert_eq!(
            html,
            "<ul>\n<li>\n<ul>\n<li>\n<p>deep</p>\n</li>\n</ul>\n</li>\n</ul>"
        );
    }

    #[test]
    fn code_blocks() {
        let html = render_blocks(&[
            Block::code(BlockKind::FencedCode, "a < b").with_lang(Some("rust".into())),
            Block::code(BlockKind::MathCode, "x^2"),
            Block::rule(),
        ]);
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">a &lt; b</code></pre>\n<pre class=\"math\"><code>x^2</code></pre>\n<hr>"
        );
    }

    #[test]
    fn table_with_alignment_and_header_rule() {
        let table = Table::new(
            vec![Align::Left, Align::Default],
            vec![
                vec![vec![Element::plain("A")], vec![Element::plain("B")]],
                vec![vec![Element::plain("a")], vec![Element::plain("b")]],
            ],
        );
        assert_eq!(
            render_blocks(&[Block::table_block(table)]),
            [
                "<table>",
                "<thead>",
                "<tr style=\"border-bottom: 1px solid\">",
                "<th style=\"text-align: left\">A</th>",
                "<th>B</th>",
                "</tr>",
                "</thead>",
                "<tbody>",
                "<tr>",
                "<td style=\"text-align: left\">a</td>",
                "<td>b</td>",
                "</tr>",
                "</tbody>",
                "</table>",
            ]
            .join("\n")
        );
    }
}
