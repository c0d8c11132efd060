//! Adapter from `pulldown-cmark` events to the [`SourceNode`] tree.
//!
//! pulldown-cmark reports a flat, balanced stream of start/end events. A frame
//! stack rebuilds the containment the normalizer walks. Every `End` closes the
//! innermost frame, so the adapter never needs to inspect end tags.
//!
//! pulldown-cmark decodes character references itself, so entities arrive
//! as ordinary text and this adapter never emits [`SourceInline::Entity`].

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag};

use super::tree::{CodeKind, SourceInline, SourceListItem, SourceNode};
use crate::models::Align;

const BULLETS: [char; 3] = ['-', '*', '+'];

pub fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Parses `text` with pulldown-cmark and returns the top-level nodes.
pub fn build_tree(text: &str) -> Vec<SourceNode> {
    let mut builder = TreeBuilder::new(text);
    for (event, range) in Parser::new_ext(text, parser_options()).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

#[derive(Debug)]
enum LeafFrame {
    Paragraph,
    /// Paragraph opened for text that arrived without a paragraph tag
    /// (tight list items).
    Implicit,
    Heading(u8),
}

#[derive(Debug)]
enum SpanFrame {
    Emphasis(u8),
    Strike,
    Link {
        url: String,
        title: String,
        is_image: bool,
    },
    Autolink(String),
}

#[derive(Debug)]
enum Frame {
    Root(Vec<SourceNode>),
    Quote(Vec<SourceNode>),
    List {
        ordered: bool,
        bullet: char,
        start: u64,
        items: Vec<SourceListItem>,
    },
    Item(Vec<SourceNode>),
    Leaf {
        kind: LeafFrame,
        inlines: Vec<SourceInline>,
    },
    Code {
        kind: CodeKind,
        text: String,
    },
    HtmlBlock(String),
    Table {
        aligns: Vec<Align>,
        rows: Vec<Vec<Vec<SourceInline>>>,
    },
    Row(Vec<Vec<SourceInline>>),
    Cell(Vec<SourceInline>),
    Span {
        kind: SpanFrame,
        children: Vec<SourceInline>,
    },
    Skipped(&'static str),
}

struct TreeBuilder<'a> {
    source: &'a str,
    stack: Vec<Frame>,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            stack: vec![Frame::Root(Vec::new())],
        }
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(_) => {
                self.close_implicit();
                self.pop();
            }
            Event::Text(text) => {
                if let Some(Frame::Code { text: code, .. }) = self.stack.last_mut() {
                    code.push_str(&text);
                } else {
                    self.push_inline(SourceInline::Text(text.into_string()));
                }
            }
            Event::Code(code) => self.push_inline(SourceInline::Code(code.into_string())),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_inline(SourceInline::Math(math.into_string()))
            }
            Event::Html(html) => {
                if let Some(Frame::HtmlBlock(buf)) = self.stack.last_mut() {
                    buf.push_str(&html);
                } else {
                    self.push_node(SourceNode::Html(html.into_string()));
                }
            }
            Event::InlineHtml(html) => self.push_inline(SourceInline::Html(html.into_string())),
            Event::SoftBreak => self.push_inline(SourceInline::SoftBreak),
            Event::HardBreak => self.push_inline(SourceInline::HardBreak),
            Event::Rule => self.push_node(SourceNode::ThematicBreak),
            other => log::debug!("skipping unsupported event {other:?}"),
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let frame = match tag {
            Tag::Emphasis => span(SpanFrame::Emphasis(1)),
            Tag::Strong => span(SpanFrame::Emphasis(2)),
            Tag::Strikethrough => span(SpanFrame::Strike),
            Tag::Link {
                link_type: LinkType::Autolink | LinkType::Email,
                dest_url,
                ..
            } => span(SpanFrame::Autolink(dest_url.into_string())),
            Tag::Link {
                dest_url, title, ..
            } => span(SpanFrame::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
                is_image: false,
            }),
            Tag::Image {
                dest_url, title, ..
            } => span(SpanFrame::Link {
                url: dest_url.into_string(),
                title: title.into_string(),
                is_image: true,
            }),
            block => {
                self.close_implicit();
                self.block_frame(block, range)
            }
        };
        self.stack.push(frame);
    }

    fn block_frame(&self, tag: Tag<'_>, range: Range<usize>) -> Frame {
        match tag {
            Tag::Paragraph => Frame::Leaf {
                kind: LeafFrame::Paragraph,
                inlines: Vec::new(),
            },
            Tag::Heading { level, .. } => Frame::Leaf {
                kind: LeafFrame::Heading(heading_level_to_u8(level)),
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Frame::Quote(Vec::new()),
            Tag::CodeBlock(CodeBlockKind::Indented) => Frame::Code {
                kind: CodeKind::Indented,
                text: String::new(),
            },
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
                let lang = info.split_whitespace().next().map(str::to_string);
                let kind = match lang.as_deref() {
                    Some("math") => CodeKind::Math,
                    _ => CodeKind::Fenced(lang),
                };
                Frame::Code {
                    kind,
                    text: String::new(),
                }
            }
            Tag::HtmlBlock => Frame::HtmlBlock(String::new()),
            Tag::List(start) => Frame::List {
                ordered: start.is_some(),
                bullet: self.bullet_at(range.start),
                start: start.unwrap_or(1),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item(Vec::new()),
            Tag::Table(aligns) => Frame::Table {
                aligns: aligns.into_iter().map(convert_align).collect(),
                rows: Vec::new(),
            },
            Tag::TableHead | Tag::TableRow => Frame::Row(Vec::new()),
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::FootnoteDefinition(_) => Frame::Skipped("footnote definition"),
            Tag::MetadataBlock(_) => Frame::Skipped("metadata block"),
            other => {
                log::debug!("skipping unsupported container {other:?}");
                Frame::Skipped("unsupported container")
            }
        }
    }

    /// Reads the list marker glyph from the source at the list's offset.
    fn bullet_at(&self, offset: usize) -> char {
        self.source
            .get(offset..)
            .and_then(|rest| {
                rest.trim_start_matches(|c: char| c.is_whitespace() || c == '>')
                    .chars()
                    .next()
            })
            .filter(|c| BULLETS.contains(c))
            .unwrap_or('-')
    }

    fn close_implicit(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Leaf {
                kind: LeafFrame::Implicit,
                ..
            })
        ) {
            self.pop();
        }
    }

    fn pop(&mut self) {
        if self.stack.len() <= 1 {
            log::debug!("unbalanced end event ignored");
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Root(_) => {}
            Frame::Quote(children) => self.push_node(SourceNode::Quote(children)),
            Frame::List {
                ordered,
                bullet,
                start,
                items,
            } => self.push_node(SourceNode::List {
                ordered,
                bullet,
                start,
                items,
            }),
            Frame::Item(children) => {
                if let Some(Frame::List {
                    ordered,
                    start,
                    items,
                    ..
                }) = self.stack.last_mut()
                {
                    let order = if *ordered {
                        *start + items.len() as u64
                    } else {
                        0
                    };
                    items.push(SourceListItem { order, children });
                } else {
                    for child in children {
                        self.push_node(child);
                    }
                }
            }
            Frame::Leaf { kind, inlines } => {
                let node = match kind {
                    LeafFrame::Paragraph | LeafFrame::Implicit => SourceNode::Paragraph(inlines),
                    LeafFrame::Heading(level) => SourceNode::Heading { level, inlines },
                };
                self.push_node(node);
            }
            Frame::Code { kind, text } => self.push_node(SourceNode::CodeBlock { kind, text }),
            Frame::HtmlBlock(html) => self.push_node(SourceNode::Html(html)),
            Frame::Table { aligns, rows } => self.push_node(SourceNode::Table { aligns, rows }),
            Frame::Row(cells) => {
                if let Some(Frame::Table { rows, .. }) = self.stack.last_mut() {
                    rows.push(cells);
                }
            }
            Frame::Cell(inlines) => {
                if let Some(Frame::Row(cells)) = self.stack.last_mut() {
                    cells.push(inlines);
                }
            }
            Frame::Span { kind, children } => {
                let inline = match kind {
                    SpanFrame::Emphasis(delims) => SourceInline::Emphasis { delims, children },
                    SpanFrame::Strike => SourceInline::Strikethrough(children),
                    SpanFrame::Link {
                        url,
                        title,
                        is_image,
                    } => SourceInline::Link {
                        url,
                        title,
                        is_image,
                        children,
                    },
                    SpanFrame::Autolink(url) => SourceInline::Autolink(url),
                };
                self.push_inline(inline);
            }
            Frame::Skipped(what) => self.push_node(SourceNode::Unknown(what)),
        }
    }

    fn push_node(&mut self, node: SourceNode) {
        self.close_implicit();
        match self.stack.last_mut() {
            Some(Frame::Root(children) | Frame::Quote(children) | Frame::Item(children)) => {
                children.push(node)
            }
            Some(Frame::Skipped(what)) => log::debug!("dropping {node:?} inside {what}"),
            _ => log::debug!("block {node:?} outside a block container"),
        }
    }

    fn push_inline(&mut self, inline: SourceInline) {
        if matches!(
            self.stack.last(),
            Some(Frame::Root(_) | Frame::Quote(_) | Frame::Item(_))
        ) {
            self.stack.push(Frame::Leaf {
                kind: LeafFrame::Implicit,
                inlines: Vec::new(),
            });
        }
        let target = match self.stack.last_mut() {
            Some(Frame::Leaf { inlines, .. })
            | Some(Frame::Cell(inlines))
            | Some(Frame::Span {
                children: inlines, ..
            }) => inlines,
            _ => return,
        };
        // pulldown-cmark splits literal text at delimiter candidates
        match (target.last_mut(), inline) {
            (Some(SourceInline::Text(prev)), SourceInline::Text(next)) => prev.push_str(&next),
            (_, inline) => target.push(inline),
        }
    }

    fn finish(mut self) -> Vec<SourceNode> {
        self.close_implicit();
        while self.stack.len() > 1 {
            self.pop();
        }
        match self.stack.pop() {
            Some(Frame::Root(children)) => children,
            _ => Vec::new(),
        }
    }
}

fn span(kind: SpanFrame) -> Frame {
    Frame::Span {
        kind,
        children: Vec::new(),
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_align(align: Alignment) -> Align {
    match align {
        Alignment::None => Align::Default,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}
