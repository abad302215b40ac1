//! Pull parser: walks the block tree and yields [`Event`]s.
//!
//! Blocks are parsed up front; inline content is parsed when the traversal
//! reaches a paragraph or heading, and only that leaf's events are buffered.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::ops;

use smallvec::SmallVec;

use crate::block::{parse_blocks, BlockKind, LeafText, NodeId, Tree};
use crate::error::LimitExceeded;
use crate::escape::{decode_entities, unescape, unescape_and_decode};
use crate::inline::links::LinkTarget;
use crate::inline::{InlineContext, InlineEvent, InlineParser};
use crate::link_ref::LinkRefStore;
use crate::{CodeBlockKind, Event, LinkType, Options, Range, Tag, TagEnd};

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    next_child: usize,
}

/// Markdown pull parser.
///
/// # Example
/// ```
/// use wikimark::{Event, Parser, Tag};
///
/// let events: Vec<Event> = Parser::new("see [[Home|the start]]").collect();
/// assert!(events.contains(&Event::Start(Tag::WikiLink {
///     target: "Home".into(),
///     label: "the start".into(),
/// })));
/// ```
pub struct Parser<'a> {
    input: &'a str,
    options: Options,
    tree: Tree,
    refs: LinkRefStore,
    inline: InlineParser,
    inline_events: Vec<(InlineEvent, Range)>,
    stack: SmallVec<[Frame; 16]>,
    pending: VecDeque<(Event<'a>, ops::Range<usize>)>,
    limits: Vec<LimitExceeded>,
}

impl<'a> Parser<'a> {
    /// Parse with default options.
    pub fn new(input: &'a str) -> Self {
        Self::new_ext(input, Options::default())
    }

    /// Parse with the given options.
    pub fn new_ext(input: &'a str, options: Options) -> Self {
        let blocks = parse_blocks(input, options);
        let root = blocks.tree.root();
        let mut stack = SmallVec::new();
        stack.push(Frame {
            node: root,
            next_child: 0,
        });
        Self {
            input,
            options,
            tree: blocks.tree,
            refs: blocks.refs,
            inline: InlineParser::new(),
            inline_events: Vec::new(),
            stack,
            pending: VecDeque::new(),
            limits: blocks.limits,
        }
    }

    /// Yield `(event, source byte range)` pairs instead of bare events.
    pub fn into_offset_iter(self) -> OffsetIter<'a> {
        OffsetIter { parser: self }
    }

    /// Guards tripped so far. Block-level guards are known up front; inline
    /// ones appear as the leaves containing them are reached.
    pub fn limits_exceeded(&self) -> &[LimitExceeded] {
        &self.limits
    }

    fn next_event(&mut self) -> Option<(Event<'a>, ops::Range<usize>)> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let frame = *self.stack.last()?;
            let child = self.tree.node(frame.node).children.get(frame.next_child).copied();
            match child {
                Some(child) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.next_child += 1;
                    }
                    self.enter(child);
                }
                None => {
                    self.stack.pop();
                    let node = self.tree.node(frame.node);
                    let end = match node.kind {
                        BlockKind::BlockQuote => TagEnd::BlockQuote,
                        BlockKind::List { data, .. } => TagEnd::List(data.ordered),
                        BlockKind::Item(_) => TagEnd::Item,
                        _ => continue,
                    };
                    return Some((Event::End(end), node.span.into()));
                }
            }
        }
    }

    fn push(&mut self, event: Event<'a>, range: Range) {
        self.pending.push_back((event, range.into()));
    }

    fn push_frame(&mut self, node: NodeId) {
        self.stack.push(Frame { node, next_child: 0 });
    }

    fn enter(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        let (kind, span) = (node.kind, node.span);
        match kind {
            BlockKind::Document => self.push_frame(id),
            BlockKind::BlockQuote => {
                self.push(Event::Start(Tag::BlockQuote), span);
                self.push_frame(id);
            }
            BlockKind::List { data, tight } => {
                let start = data.ordered.then_some(data.start);
                self.push(Event::Start(Tag::List { start, tight }), span);
                self.push_frame(id);
            }
            BlockKind::Item(_) => {
                self.push(Event::Start(Tag::Item), span);
                self.push_frame(id);
            }
            BlockKind::Paragraph => {
                self.push(Event::Start(Tag::Paragraph), span);
                self.push_inline(id);
                self.push(Event::End(TagEnd::Paragraph), span);
            }
            BlockKind::Heading { level } => {
                self.push(Event::Start(Tag::Heading { level }), span);
                self.push_inline(id);
                self.push(Event::End(TagEnd::Heading(level)), span);
            }
            BlockKind::ThematicBreak => self.push(Event::Rule, span),
            BlockKind::IndentedCode => {
                self.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)), span);
                self.push_lines(id, Event::Text);
                self.push(Event::End(TagEnd::CodeBlock), span);
            }
            BlockKind::FencedCode(fence) => {
                let info = fence.info.slice_str(self.input).unwrap_or_default();
                let kind = CodeBlockKind::Fenced(unescape_and_decode(info));
                self.push(Event::Start(Tag::CodeBlock(kind)), span);
                self.push_lines(id, Event::Text);
                self.push(Event::End(TagEnd::CodeBlock), span);
            }
            BlockKind::HtmlBlock(_) => {
                self.push(Event::Start(Tag::HtmlBlock), span);
                self.push_lines(id, Event::Html);
                self.push(Event::End(TagEnd::HtmlBlock), span);
            }
        }
    }

    /// One event per raw content line, newline included.
    fn push_lines(&mut self, id: NodeId, make: fn(Cow<'a, str>) -> Event<'a>) {
        let input = self.input;
        for line in &self.tree.node(id).lines {
            let body = line.range.slice_str(input).unwrap_or_default();
            let end = line.range.end_usize();
            let text = if line.virtual_spaces == 0 && input.as_bytes().get(end) == Some(&b'\n') {
                Cow::Borrowed(&input[line.range.start_usize()..end + 1])
            } else {
                let mut owned = String::with_capacity(body.len() + 5);
                owned.extend(std::iter::repeat_n(' ', line.virtual_spaces as usize));
                owned.push_str(body);
                owned.push('\n');
                Cow::Owned(owned)
            };
            self.pending.push_back((make(text), line.range.into()));
        }
    }

    /// Parse the inline content of a paragraph or heading.
    fn push_inline(&mut self, id: NodeId) {
        let input = self.input;
        let leaf = LeafText::new(input, &self.tree.node(id).lines);
        log::trace!("inline content of {} bytes at {}", leaf.text.len(), self.tree.node(id).span.start);

        let ctx = InlineContext {
            refs: &self.refs,
            wikilinks: self.options.wikilinks,
            allow_html: self.options.allow_html,
        };
        let mut events = std::mem::take(&mut self.inline_events);
        events.clear();
        self.inline.parse(&leaf.text, ctx, &mut events);
        for (kind, at) in self.inline.drain_limits() {
            let src = leaf.source_range(Range::empty_at(at));
            self.limits.push(LimitExceeded::new(kind, src.start_usize()));
        }

        let mut text: Option<(Cow<'a, str>, Range)> = None;
        for &(event, range) in &events {
            let src = leaf.source_range(range);
            let piece = match event {
                InlineEvent::Text(r) => Some(apply(leaf.slice(input, r), decode_entities)),
                InlineEvent::Escaped(_) => Some(leaf.slice(input, Range::new(range.start + 1, range.end))),
                _ => None,
            };
            if let Some(piece) = piece {
                text = Some(match text.take() {
                    None => (piece, src),
                    Some((mut acc, acc_src)) => {
                        acc.to_mut().push_str(&piece);
                        (acc, Range::new(acc_src.start, src.end))
                    }
                });
                continue;
            }
            if let Some((acc, acc_src)) = text.take() {
                self.push(Event::Text(acc), acc_src);
            }
            self.push_inline_event(&leaf, event, src);
        }
        if let Some((acc, acc_src)) = text.take() {
            self.push(Event::Text(acc), acc_src);
        }

        self.inline_events = events;
    }

    fn push_inline_event(&mut self, leaf: &LeafText<'a>, event: InlineEvent, src: Range) {
        let input = self.input;
        match event {
            InlineEvent::Text(_) | InlineEvent::Escaped(_) => {}
            InlineEvent::Code(r) => self.push(Event::Code(code_text(leaf.slice(input, r))), src),
            InlineEvent::EmphasisStart => self.push(Event::Start(Tag::Emphasis), src),
            InlineEvent::EmphasisEnd => self.push(Event::End(TagEnd::Emphasis), src),
            InlineEvent::StrongStart => self.push(Event::Start(Tag::Strong), src),
            InlineEvent::StrongEnd => self.push(Event::End(TagEnd::Strong), src),
            InlineEvent::LinkStart { target } => {
                let (link_type, dest_url, title) = self.link_parts(leaf, target);
                self.push(Event::Start(Tag::Link { link_type, dest_url, title }), src);
            }
            InlineEvent::LinkEnd => self.push(Event::End(TagEnd::Link), src),
            InlineEvent::ImageStart { target } => {
                let (link_type, dest_url, title) = self.link_parts(leaf, target);
                self.push(Event::Start(Tag::Image { link_type, dest_url, title }), src);
            }
            InlineEvent::ImageEnd => self.push(Event::End(TagEnd::Image), src),
            InlineEvent::Autolink { url, is_email } => {
                let url = leaf.slice(input, url);
                let link_type = if is_email { LinkType::Email } else { LinkType::Autolink };
                self.push(
                    Event::Start(Tag::Link {
                        link_type,
                        dest_url: url.clone(),
                        title: Cow::Borrowed(""),
                    }),
                    src,
                );
                self.push(Event::Text(url), src);
                self.push(Event::End(TagEnd::Link), src);
            }
            InlineEvent::Html(r) => self.push(Event::InlineHtml(leaf.slice(input, r)), src),
            InlineEvent::SoftBreak => self.push(Event::SoftBreak, src),
            InlineEvent::HardBreak => self.push(Event::HardBreak, src),
            InlineEvent::WikiLink { target, label } => {
                let target = apply(leaf.slice(input, target), unescape);
                let label = label
                    .map(|l| apply(leaf.slice(input, l), unescape))
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| target.clone());
                self.push(
                    Event::Start(Tag::WikiLink {
                        target,
                        label: label.clone(),
                    }),
                    src,
                );
                self.push(Event::Text(label), src);
                self.push(Event::End(TagEnd::WikiLink), src);
            }
        }
    }

    fn link_parts(&self, leaf: &LeafText<'a>, target: LinkTarget) -> (LinkType, Cow<'a, str>, Cow<'a, str>) {
        match target {
            LinkTarget::Inline { dest, title } => {
                let dest_url = apply(leaf.slice(self.input, dest), unescape_and_decode);
                let title = title.map_or(Cow::Borrowed(""), |t| {
                    apply(leaf.slice(self.input, t), unescape_and_decode)
                });
                (LinkType::Inline, dest_url, title)
            }
            LinkTarget::Reference { def, link_type } => match self.refs.get(def as usize) {
                Some(def) => (
                    link_type,
                    Cow::Owned(def.dest.clone()),
                    Cow::Owned(def.title.clone()),
                ),
                None => (link_type, Cow::Borrowed(""), Cow::Borrowed("")),
            },
        }
    }
}

impl<'a> Iterator for Parser<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        self.next_event().map(|(event, _)| event)
    }
}

/// Iterator over events paired with their source byte ranges.
pub struct OffsetIter<'a> {
    parser: Parser<'a>,
}

impl OffsetIter<'_> {
    pub fn limits_exceeded(&self) -> &[LimitExceeded] {
        self.parser.limits_exceeded()
    }
}

impl<'a> Iterator for OffsetIter<'a> {
    type Item = (Event<'a>, ops::Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_event()
    }
}

/// Run a borrowed-or-owned string through a transform that only allocates
/// when it changes something.
fn apply<'a>(piece: Cow<'a, str>, f: for<'s> fn(&'s str) -> Cow<'s, str>) -> Cow<'a, str> {
    match piece {
        Cow::Borrowed(s) => f(s),
        Cow::Owned(s) => {
            let changed = match f(&s) {
                Cow::Owned(changed) => Some(changed),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(changed.unwrap_or(s))
        }
    }
}

/// Code span content: line endings become spaces, and one space is
/// stripped from each end when both ends have one and the content is not
/// all spaces.
fn code_text(raw: Cow<'_, str>) -> Cow<'_, str> {
    let raw = if raw.contains('\n') {
        Cow::Owned(raw.replace('\n', " "))
    } else {
        raw
    };
    let bytes = raw.as_bytes();
    let strip = bytes.len() >= 2
        && bytes[0] == b' '
        && bytes[bytes.len() - 1] == b' '
        && bytes.iter().any(|&b| b != b' ');
    if !strip {
        return raw;
    }
    match raw {
        Cow::Borrowed(s) => Cow::Borrowed(&s[1..s.len() - 1]),
        Cow::Owned(s) => Cow::Owned(s[1..s.len() - 1].to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<Event<'_>> {
        Parser::new(input).collect()
    }

    #[test]
    fn test_paragraph_text_is_borrowed() {
        let input = "hello world";
        let events = events(input);
        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                Event::Text("hello world".into()),
                Event::End(TagEnd::Paragraph),
            ]
        );
        assert!(matches!(events[1], Event::Text(Cow::Borrowed(_))));
    }

    #[test]
    fn test_escapes_and_entities_merge_into_text() {
        assert_eq!(
            events("a \\* b &amp; c")[1],
            Event::Text("a * b & c".into())
        );
    }

    #[test]
    fn test_code_span_spaces() {
        assert_eq!(events("`` `a` ``")[1], Event::Code("`a`".into()));
        assert_eq!(events("`  `")[1], Event::Code("  ".into()));
        assert_eq!(events("`a\nb`")[1], Event::Code("a b".into()));
    }

    #[test]
    fn test_code_block_lines() {
        let events = events("```rust\nfn main() {}\n```\n");
        assert_eq!(
            events,
            vec![
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced("rust".into()))),
                Event::Text("fn main() {}\n".into()),
                Event::End(TagEnd::CodeBlock),
            ]
        );
    }

    #[test]
    fn test_offsets() {
        let input = "# Hi\n\n*a*";
        let ranges: Vec<_> = Parser::new(input).into_offset_iter().collect();
        let heading_text = ranges
            .iter()
            .find(|(e, _)| *e == Event::Text("Hi".into()))
            .map(|(_, r)| r.clone());
        assert_eq!(heading_text, Some(2..4));
        let emphasis = ranges
            .iter()
            .find(|(e, _)| *e == Event::Text("a".into()))
            .map(|(_, r)| r.clone());
        assert_eq!(emphasis, Some(7..8));
    }

    #[test]
    fn test_reference_link() {
        let events = events("[x]\n\n[x]: /dest 'T'");
        assert_eq!(
            events[1],
            Event::Start(Tag::Link {
                link_type: LinkType::Shortcut,
                dest_url: "/dest".into(),
                title: "T".into(),
            })
        );
    }

    #[test]
    fn test_tight_list_keeps_paragraphs() {
        let events = events("- a\n- b");
        assert_eq!(events[0], Event::Start(Tag::List { start: None, tight: true }));
        assert_eq!(events[2], Event::Start(Tag::Paragraph));
        assert_eq!(events.last(), Some(&Event::End(TagEnd::List(false))));
    }
}
