//! Public event types yielded by [`Parser`](crate::Parser).

use std::borrow::Cow;

/// Kind of code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeBlockKind<'a> {
    /// Indented by four or more columns.
    Indented,
    /// Fenced with backticks or tildes; carries the (possibly empty) info string.
    Fenced(Cow<'a, str>),
}

impl CodeBlockKind<'_> {
    pub fn is_fenced(&self) -> bool {
        matches!(self, Self::Fenced(_))
    }
}

/// How a link or image destination was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// `[text](dest "title")`
    Inline,
    /// `[text][label]`
    Reference,
    /// `[label][]`
    Collapsed,
    /// `[label]`
    Shortcut,
    /// `<https://example.com>`
    Autolink,
    /// `<user@example.com>`
    Email,
}

/// Container and span kinds that open with [`Event::Start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag<'a> {
    Paragraph,
    /// ATX or setext heading, level 1-6.
    Heading { level: u8 },
    BlockQuote,
    CodeBlock(CodeBlockKind<'a>),
    /// Raw HTML block; contents arrive as [`Event::Html`].
    HtmlBlock,
    /// Ordered lists carry their first number.
    List { start: Option<u64>, tight: bool },
    Item,
    Emphasis,
    Strong,
    Link {
        link_type: LinkType,
        dest_url: Cow<'a, str>,
        title: Cow<'a, str>,
    },
    Image {
        link_type: LinkType,
        dest_url: Cow<'a, str>,
        title: Cow<'a, str>,
    },
    /// `[[target]]` or `[[target|label]]`. The label text follows as a
    /// [`Event::Text`].
    WikiLink {
        target: Cow<'a, str>,
        label: Cow<'a, str>,
    },
}

impl Tag<'_> {
    /// Matching end marker.
    pub fn to_end(&self) -> TagEnd {
        match self {
            Self::Paragraph => TagEnd::Paragraph,
            Self::Heading { level } => TagEnd::Heading(*level),
            Self::BlockQuote => TagEnd::BlockQuote,
            Self::CodeBlock(_) => TagEnd::CodeBlock,
            Self::HtmlBlock => TagEnd::HtmlBlock,
            Self::List { start, .. } => TagEnd::List(start.is_some()),
            Self::Item => TagEnd::Item,
            Self::Emphasis => TagEnd::Emphasis,
            Self::Strong => TagEnd::Strong,
            Self::Link { .. } => TagEnd::Link,
            Self::Image { .. } => TagEnd::Image,
            Self::WikiLink { .. } => TagEnd::WikiLink,
        }
    }

    /// Detach from the input buffer.
    pub fn into_static(self) -> Tag<'static> {
        fn own(s: Cow<'_, str>) -> Cow<'static, str> {
            Cow::Owned(s.into_owned())
        }
        match self {
            Self::Paragraph => Tag::Paragraph,
            Self::Heading { level } => Tag::Heading { level },
            Self::BlockQuote => Tag::BlockQuote,
            Self::CodeBlock(CodeBlockKind::Indented) => Tag::CodeBlock(CodeBlockKind::Indented),
            Self::CodeBlock(CodeBlockKind::Fenced(info)) => {
                Tag::CodeBlock(CodeBlockKind::Fenced(own(info)))
            }
            Self::HtmlBlock => Tag::HtmlBlock,
            Self::List { start, tight } => Tag::List { start, tight },
            Self::Item => Tag::Item,
            Self::Emphasis => Tag::Emphasis,
            Self::Strong => Tag::Strong,
            Self::Link { link_type, dest_url, title } => Tag::Link {
                link_type,
                dest_url: own(dest_url),
                title: own(title),
            },
            Self::Image { link_type, dest_url, title } => Tag::Image {
                link_type,
                dest_url: own(dest_url),
                title: own(title),
            },
            Self::WikiLink { target, label } => Tag::WikiLink {
                target: own(target),
                label: own(label),
            },
        }
    }
}

/// End marker for a [`Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEnd {
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    /// `true` for ordered lists.
    List(bool),
    Item,
    Emphasis,
    Strong,
    Link,
    Image,
    WikiLink,
}

/// One unit of parsed output, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    Start(Tag<'a>),
    End(TagEnd),
    /// Literal text, with escapes and entities already resolved.
    Text(Cow<'a, str>),
    /// Inline code span contents.
    Code(Cow<'a, str>),
    /// A line of a raw HTML block.
    Html(Cow<'a, str>),
    /// Raw inline HTML.
    InlineHtml(Cow<'a, str>),
    SoftBreak,
    HardBreak,
    /// Thematic break.
    Rule,
}

impl Event<'_> {
    /// Detach from the input buffer.
    pub fn into_static(self) -> Event<'static> {
        match self {
            Self::Start(tag) => Event::Start(tag.into_static()),
            Self::End(end) => Event::End(end),
            Self::Text(t) => Event::Text(Cow::Owned(t.into_owned())),
            Self::Code(t) => Event::Code(Cow::Owned(t.into_owned())),
            Self::Html(t) => Event::Html(Cow::Owned(t.into_owned())),
            Self::InlineHtml(t) => Event::InlineHtml(Cow::Owned(t.into_owned())),
            Self::SoftBreak => Event::SoftBreak,
            Self::HardBreak => Event::HardBreak,
            Self::Rule => Event::Rule,
        }
    }
}
