use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::render::{self, OutputFormat};

/// Inline styling flags carried by an [`Element`].
///
/// A small copyable bitset; combine flags with `|`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Styling(u16);

impl Styling {
    pub const NONE: Styling = Styling(0);
    pub const EMPHASIS: Styling = Styling(1 << 0);
    pub const STRONG: Styling = Styling(1 << 1);
    pub const CODE: Styling = Styling(1 << 2);
    pub const MONO: Styling = Styling(1 << 3);
    pub const MATH: Styling = Styling(1 << 4);
    pub const UNDERLINE: Styling = Styling(1 << 5);
    pub const STRIKE: Styling = Styling(1 << 6);
    pub const SUB: Styling = Styling(1 << 7);
    pub const SUP: Styling = Styling(1 << 8);
    pub const MARK: Styling = Styling(1 << 9);
    pub const KEYWORD: Styling = Styling(1 << 10);
    pub const GRAYED: Styling = Styling(1 << 11);

    const NAMES: [(Styling, &'static str); 12] = [
        (Self::EMPHASIS, "Emphasis"),
        (Self::STRONG, "Strong"),
        (Self::CODE, "Code"),
        (Self::MONO, "Mono"),
        (Self::MATH, "Math"),
        (Self::UNDERLINE, "Underline"),
        (Self::STRIKE, "Strike"),
        (Self::SUB, "Sub"),
        (Self::SUP, "Sup"),
        (Self::MARK, "Mark"),
        (Self::KEYWORD, "Keyword"),
        (Self::GRAYED, "Grayed"),
    ];

    pub fn contains(self, other: Styling) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Styling) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn without(self, other: Styling) -> Styling {
        Styling(self.0 & !other.0)
    }

    /// Code-like runs are rendered verbatim (no nested markers, no escaping).
    pub fn is_verbatim(self) -> bool {
        self.intersects(Self::CODE | Self::MONO | Self::MATH)
    }
}

impl BitOr for Styling {
    type Output = Styling;

    fn bitor(self, rhs: Styling) -> Styling {
        Styling(self.0 | rhs.0)
    }
}

impl BitOrAssign for Styling {
    fn bitor_assign(&mut self, rhs: Styling) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Styling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

/// Link target attached to an inline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub uri: String,
    pub is_image: bool,
    pub title: Option<String>,
}

impl Link {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            is_image: false,
            title: None,
        }
    }

    pub fn image(uri: impl Into<String>) -> Self {
        Self {
            is_image: true,
            ..Self::new(uri)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.is_empty()).then_some(title);
        self
    }
}

/// One styled run of inline text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    text: String,
    styling: Styling,
    link: Option<Link>,
}

impl Element {
    /// Separator inserted between paragraphs merged by the coalescer.
    pub const PARAGRAPH_SEPARATOR: &'static str = "\n\n";

    pub fn new(text: impl Into<String>, styling: Styling) -> Self {
        Self {
            text: text.into(),
            styling,
            link: None,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Styling::NONE)
    }

    pub fn paragraph_separator() -> Self {
        Self::plain(Self::PARAGRAPH_SEPARATOR)
    }

    pub fn with_link(mut self, link: Option<Link>) -> Self {
        self.link = link;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn styling(&self) -> Styling {
        self.styling
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Two runs can be joined when only their text differs.
    pub fn is_mergeable_with(&self, other: &Element) -> bool {
        self.styling == other.styling && self.link == other.link
    }

    pub fn to_string(&self, format: OutputFormat) -> String {
        render::render_elements(std::slice::from_ref(self), format)
    }

    pub(crate) fn trimmed_end(mut self) -> Self {
        let len = self.text.trim_end().len();
        self.text.truncate(len);
        self
    }
}

/// Joins adjacent mergeable runs and drops a single empty trailing run.
pub fn merge_elements(elements: Vec<Element>) -> Vec<Element> {
    let mut out: Vec<Element> = Vec::with_capacity(elements.len());
    for element in elements {
        match out.last_mut() {
            Some(last) if last.is_mergeable_with(&element) => last.text.push_str(&element.text),
            _ => out.push(element),
        }
    }
    if out.last().is_some_and(Element::is_empty) {
        out.pop();
    }
    out
}

/// Concatenated text of a run sequence, ignoring styling.
pub fn plain_text(elements: &[Element]) -> String {
    elements.iter().map(Element::text).collect()
}
