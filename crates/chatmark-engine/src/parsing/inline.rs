//! Flattens an inline span tree into styled [`Element`] runs.

use std::sync::OnceLock;

use regex::Regex;

use super::ParseOptions;
use super::tree::SourceInline;
use crate::models::{Element, Link, Styling, element::merge_elements};

/// Result of resolving one raw HTML tag.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HtmlTag {
    Open(Styling),
    Close(Styling),
    LinkOpen(Link),
    LinkClose,
    Break,
    Unknown,
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"^<\s*(/)?\s*([A-Za-z][A-Za-z0-9]*)([^>]*?)(/)?\s*>$").expect("Invalid tag regex")
    })
}

fn attr_regex() -> &'static Regex {
    static ATTR_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTR_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
            .expect("Invalid attribute regex")
    })
}

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| Regex::new(r"https?://[^\s<>\[\]]+").expect("Invalid URL regex"))
}

fn html_split_regex() -> &'static Regex {
    static SPLIT_REGEX: OnceLock<Regex> = OnceLock::new();
    SPLIT_REGEX.get_or_init(|| Regex::new(r"<[^<>]*>").expect("Invalid HTML split regex"))
}

fn styling_for_tag(name: &str) -> Option<Styling> {
    let styling = match name {
        "b" | "strong" => Styling::STRONG,
        "i" | "em" => Styling::EMPHASIS,
        "u" | "ins" => Styling::UNDERLINE,
        "s" | "strike" | "del" => Styling::STRIKE,
        "sub" => Styling::SUB,
        "sup" => Styling::SUP,
        "mark" => Styling::MARK,
        "kbd" => Styling::KEYWORD,
        "code" | "tt" => Styling::MONO,
        "small" => Styling::GRAYED,
        _ => return None,
    };
    Some(styling)
}

fn resolve_tag(raw: &str) -> HtmlTag {
    let Some(caps) = tag_regex().captures(raw.trim()) else {
        return HtmlTag::Unknown;
    };
    let closing = caps.get(1).is_some();
    let name = caps[2].to_ascii_lowercase();
    let attrs = caps.get(3).map_or("", |m| m.as_str());

    if name == "br" {
        return HtmlTag::Break;
    }
    if name == "a" {
        if closing {
            return HtmlTag::LinkClose;
        }
        let mut href = None;
        let mut title = String::new();
        for attr in attr_regex().captures_iter(attrs) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            let value = html_escape::decode_html_entities(value).into_owned();
            match attr[1].to_ascii_lowercase().as_str() {
                "href" => href = Some(value),
                "title" => title = value,
                _ => {}
            }
        }
        return match href {
            Some(href) => HtmlTag::LinkOpen(Link::new(href).with_title(title)),
            None => HtmlTag::Unknown,
        };
    }
    match styling_for_tag(&name) {
        Some(styling) if closing => HtmlTag::Close(styling),
        Some(styling) => HtmlTag::Open(styling),
        None => HtmlTag::Unknown,
    }
}

/// Splits a raw HTML block into tag and text spans.
pub(crate) fn split_html(html: &str) -> Vec<SourceInline> {
    let mut spans = Vec::new();
    let mut pos = 0;
    for tag in html_split_regex().find_iter(html) {
        if tag.start() > pos {
            spans.push(SourceInline::Text(decode(&html[pos..tag.start()])));
        }
        spans.push(SourceInline::Html(tag.as_str().to_string()));
        pos = tag.end();
    }
    if pos < html.len() {
        spans.push(SourceInline::Text(decode(&html[pos..])));
    }
    spans
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Walks inline spans accumulating styling and link context.
pub(crate) struct InlineFlattener<'o> {
    options: &'o ParseOptions,
    base: Styling,
    /// Styles opened by inline HTML tags, closed by the matching end tag.
    html_styles: Vec<Styling>,
    links: Vec<Link>,
    html_links: usize,
    out: Vec<Element>,
}

impl<'o> InlineFlattener<'o> {
    pub(crate) fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            base: Styling::NONE,
            html_styles: Vec::new(),
            links: Vec::new(),
            html_links: 0,
            out: Vec::new(),
        }
    }

    /// Flattens `spans` and returns merged runs.
    pub(crate) fn flatten(mut self, spans: &[SourceInline]) -> Vec<Element> {
        self.walk(spans);
        merge_elements(self.out)
    }

    fn styling(&self) -> Styling {
        self.html_styles
            .iter()
            .fold(self.base, |acc, style| acc | *style)
    }

    fn link(&self) -> Option<Link> {
        self.links.last().cloned()
    }

    fn emit(&mut self, text: impl Into<String>, extra: Styling) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if self.options.ignore_inline {
            self.out.push(Element::plain(text));
            return;
        }
        let element = Element::new(text, self.styling() | extra).with_link(self.link());
        self.out.push(element);
    }

    fn walk(&mut self, spans: &[SourceInline]) {
        for span in spans {
            self.span(span);
        }
    }

    fn with_style(&mut self, style: Styling, children: &[SourceInline]) {
        let saved = self.base;
        self.base |= style;
        self.walk(children);
        self.base = saved;
    }

    fn span(&mut self, span: &SourceInline) {
        match span {
            SourceInline::Text(text) => self.text(text),
            SourceInline::Emphasis { delims, children } => {
                let style = if *delims >= 2 {
                    Styling::STRONG
                } else {
                    Styling::EMPHASIS
                };
                self.with_style(style, children);
            }
            SourceInline::Strikethrough(children) => self.with_style(Styling::STRIKE, children),
            SourceInline::Code(code) => self.emit(code.as_str(), Styling::CODE),
            SourceInline::Math(math) => self.emit(math.as_str(), Styling::MATH),
            SourceInline::Link {
                url,
                title,
                is_image,
                children,
            } => self.link_span(url, title, *is_image, children),
            SourceInline::Autolink(url) => {
                self.links.push(Link::new(url.as_str()));
                self.emit(url.as_str(), Styling::NONE);
                self.links.pop();
            }
            SourceInline::Html(raw) => self.html(raw),
            SourceInline::HardBreak => self.emit("\n", Styling::NONE),
            SourceInline::SoftBreak => self.emit(" ", Styling::NONE),
            SourceInline::Entity { decoded, .. } => self.emit(decoded.as_str(), Styling::NONE),
            SourceInline::Unknown(children) => self.walk(children),
        }
    }

    fn link_span(&mut self, url: &str, title: &str, is_image: bool, children: &[SourceInline]) {
        if is_image {
            let alt = alt_text(children);
            let text = if alt.is_empty() { url.to_string() } else { alt };
            let link = if self.options.image_as_link {
                Link::new(url)
            } else {
                Link::image(url)
            };
            self.links.push(link.with_title(title));
            self.emit(text, Styling::NONE);
            self.links.pop();
            return;
        }
        self.links.push(Link::new(url).with_title(title));
        self.walk(children);
        self.links.pop();
    }

    fn text(&mut self, text: &str) {
        let detect = !self.options.ignore_inline
            && !self.options.ignore_plain_links
            && self.links.is_empty()
            && !self.styling().is_verbatim();
        if !detect {
            self.emit(text, Styling::NONE);
            return;
        }
        let mut pos = 0;
        for (start, end) in find_urls(text) {
            self.emit(&text[pos..start], Styling::NONE);
            let url = &text[start..end];
            self.links.push(Link::new(url));
            self.emit(url, Styling::NONE);
            self.links.pop();
            pos = end;
        }
        self.emit(&text[pos..], Styling::NONE);
    }

    fn html(&mut self, raw: &str) {
        if self.options.ignore_inline {
            self.emit(raw, Styling::NONE);
            return;
        }
        match resolve_tag(raw) {
            HtmlTag::Open(style) => self.html_styles.push(style),
            HtmlTag::Close(style) => {
                if let Some(pos) = self.html_styles.iter().rposition(|s| *s == style) {
                    self.html_styles.remove(pos);
                }
            }
            HtmlTag::LinkOpen(link) => {
                self.links.push(link);
                self.html_links += 1;
            }
            HtmlTag::LinkClose => {
                if self.html_links > 0 {
                    self.links.pop();
                    self.html_links -= 1;
                }
            }
            HtmlTag::Break => self.emit("\n", Styling::NONE),
            HtmlTag::Unknown if self.options.inline_html_as_code => {
                self.emit(raw, Styling::CODE)
            }
            HtmlTag::Unknown => log::debug!("dropping unrecognized html tag {raw:?}"),
        }
    }
}

fn alt_text(children: &[SourceInline]) -> String {
    let mut alt = String::new();
    for child in children {
        match child {
            SourceInline::Text(t) | SourceInline::Code(t) | SourceInline::Math(t) => {
                alt.push_str(t)
            }
            SourceInline::Entity { decoded, .. } => alt.push_str(decoded),
            SourceInline::SoftBreak | SourceInline::HardBreak => alt.push(' '),
            SourceInline::Emphasis { children, .. }
            | SourceInline::Strikethrough(children)
            | SourceInline::Link { children, .. }
            | SourceInline::Unknown(children) => alt.push_str(&alt_text(children)),
            SourceInline::Autolink(url) => alt.push_str(url),
            SourceInline::Html(_) => {}
        }
    }
    alt
}

/// Byte ranges of bare URLs in `text`, trailing punctuation excluded.
fn find_urls(text: &str) -> Vec<(usize, usize)> {
    url_regex()
        .find_iter(text)
        .filter_map(|m| {
            let trimmed = m
                .as_str()
                .trim_end_matches(['.', ',', ':', ';', '!', '?', ')', ']', '}']);
            let scheme_end = trimmed.find("://").map_or(0, |i| i + 3);
            (trimmed.len() > scheme_end).then_some((m.start(), m.start() + trimmed.len()))
        })
        .collect()
}

/// Trims leading whitespace of the first run and trailing whitespace of the
/// last; drops runs left empty.
pub(crate) fn trim_elements(elements: Vec<Element>) -> Vec<Element> {
    let mut elements: Vec<Element> = elements;
    while let Some(first) = elements.first() {
        let trimmed = first.text().trim_start();
        if trimmed.is_empty() {
            elements.remove(0);
            continue;
        }
        if trimmed.len() != first.text().len() {
            let replacement = Element::new(trimmed, first.styling()).with_link(first.link().cloned());
            elements[0] = replacement;
        }
        break;
    }
    while let Some(last) = elements.pop() {
        let last = last.trimmed_end();
        if !last.is_empty() {
            elements.push(last);
            break;
        }
    }
    elements
}
