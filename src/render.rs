//! Normalized Markdown output.
//!
//! [`MarkdownWriter`] turns an event stream back into Markdown text. The
//! output is not the input text: emphasis is written with `*` unless that
//! would merge with a neighbouring `*` run, in which case `_` is used.
//! Headings are ATX unless they span several lines, fenced code always uses
//! the shortest safe fence, and text is backslash-escaped wherever it could
//! be read back as syntax. Parsing the output again yields the same events
//! for documents that only use constructs with a single normal form.
//!
//! Emphasis nested directly inside intraword emphasis has no such form and
//! may re-parse differently.

use rustc_hash::FxHashMap;

use crate::escape::escape_markdown_into;
use crate::inline::marks::is_flank_punctuation;
use crate::{CodeBlockKind, Event, LinkType, Tag, TagEnd};

enum Frame {
    Quote,
    List { tight: bool, next: Option<u64>, bullet: u8 },
    Item { indent: usize, marker: Option<String> },
}

/// What the previous sibling block was, for picking list markers that do
/// not merge with a preceding list.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Block,
    List(u8),
}

enum Close {
    Suffix(String),
    Silent,
}

/// An emphasis (`width` 1) or strong (`width` 2) delimiter pair of the
/// current leaf block, written as `*` until the block ends.
struct DelimPair {
    open: usize,
    close: usize,
    width: usize,
    ch: Option<u8>,
}

struct HeadingState {
    level: u8,
    /// Offset of the `#` marker in the output.
    marker: usize,
    multiline: bool,
}

/// Streaming Markdown writer.
///
/// # Example
/// ```
/// use wikimark::{MarkdownWriter, Parser};
///
/// let mut writer = MarkdownWriter::with_capacity_for(32);
/// for event in Parser::new("_hi_ [[x|y]]") {
///     writer.write_event(&event);
/// }
/// assert_eq!(writer.into_string(), "*hi* [[x|y]]\n");
/// ```
pub struct MarkdownWriter {
    out: String,
    frames: Vec<Frame>,
    /// One entry per open container, the document included.
    siblings: Vec<Last>,
    closes: Vec<Close>,
    /// Text inside autolinks and wikilinks is already part of the syntax.
    silent: usize,
    at_line_start: bool,
    code: Option<CodeState>,
    heading: Option<HeadingState>,
    pairs: Vec<DelimPair>,
    open_pairs: Vec<usize>,
}

/// Code blocks are buffered so the fence can be chosen once the body is
/// known.
struct CodeState {
    /// `None` for indented code.
    info: Option<String>,
    body: String,
}

impl Default for MarkdownWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownWriter {
    pub fn new() -> Self {
        Self::with_capacity_for(0)
    }

    /// Reserve roughly as much as the source document took.
    pub fn with_capacity_for(input_len: usize) -> Self {
        Self {
            out: String::with_capacity(input_len + input_len / 8),
            frames: Vec::new(),
            siblings: vec![Last::Nothing],
            closes: Vec::new(),
            silent: 0,
            at_line_start: true,
            code: None,
            heading: None,
            pairs: Vec::new(),
            open_pairs: Vec::new(),
        }
    }

    pub fn write_event(&mut self, event: &Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(*tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.inline_code(code),
            Event::Html(html) => self.raw_lines(html, false),
            Event::InlineHtml(html) => self.write(html),
            Event::SoftBreak if self.heading.as_ref().is_some_and(|h| h.level > 2) => {
                self.write(" ")
            }
            Event::SoftBreak => {
                self.mark_heading_multiline();
                self.newline();
            }
            Event::HardBreak => {
                self.mark_heading_multiline();
                self.write("\\");
                self.newline();
            }
            Event::Rule => {
                self.begin_block(Last::Block);
                self.write("***");
                self.newline();
            }
        }
    }

    pub fn into_string(mut self) -> String {
        self.resolve_delims();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn start(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Paragraph => self.begin_block(Last::Block),
            Tag::Heading { level } => {
                self.begin_block(Last::Block);
                let mut marker = "#".repeat(usize::from(*level));
                marker.push(' ');
                self.write(&marker);
                self.heading = Some(HeadingState {
                    level: *level,
                    marker: self.out.len() - marker.len(),
                    multiline: false,
                });
            }
            Tag::BlockQuote => {
                self.begin_block(Last::Block);
                self.frames.push(Frame::Quote);
                self.siblings.push(Last::Nothing);
            }
            Tag::CodeBlock(kind) => {
                self.begin_block(Last::Block);
                self.code = Some(CodeState {
                    info: match kind {
                        CodeBlockKind::Indented => None,
                        CodeBlockKind::Fenced(info) => Some(info.to_string()),
                    },
                    body: String::new(),
                });
            }
            Tag::HtmlBlock => self.begin_block(Last::Block),
            Tag::List { start, tight } => {
                let bullet = match (start, self.siblings.last()) {
                    (Some(_), Some(Last::List(b'.'))) => b')',
                    (Some(_), _) => b'.',
                    (None, Some(Last::List(b'-'))) => b'*',
                    (None, _) => b'-',
                };
                self.begin_block(Last::List(bullet));
                self.frames.push(Frame::List {
                    tight: *tight,
                    next: *start,
                    bullet,
                });
                self.siblings.push(Last::Nothing);
            }
            Tag::Item => {
                let marker = match self.frames.last_mut() {
                    Some(Frame::List { next: Some(n), bullet, .. }) => {
                        let marker = format!("{}{} ", n, *bullet as char);
                        *n += 1;
                        marker
                    }
                    Some(Frame::List { bullet, .. }) => format!("{} ", *bullet as char),
                    _ => "- ".to_owned(),
                };
                self.begin_block(Last::Block);
                self.frames.push(Frame::Item {
                    indent: marker.len(),
                    marker: Some(marker),
                });
                self.siblings.push(Last::Nothing);
            }
            Tag::Emphasis => self.open_delim(1),
            Tag::Strong => self.open_delim(2),
            Tag::Link { link_type, dest_url, title } | Tag::Image { link_type, dest_url, title } => {
                let image = matches!(tag, Tag::Image { .. });
                if !image && matches!(link_type, LinkType::Autolink | LinkType::Email) {
                    self.write("<");
                    self.write(dest_url);
                    self.write(">");
                    self.silent += 1;
                    self.closes.push(Close::Silent);
                    return;
                }
                self.write(if image { "![" } else { "[" });
                self.closes.push(Close::Suffix(link_suffix(dest_url, title)));
            }
            Tag::WikiLink { target, label } => {
                let mut text = String::from("[[");
                escape_markdown_into(&mut text, target);
                if label != target {
                    text.push('|');
                    escape_markdown_into(&mut text, label);
                }
                text.push_str("]]");
                self.write(&text);
                self.silent += 1;
                self.closes.push(Close::Silent);
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        if !matches!(
            tag,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link | TagEnd::Image | TagEnd::WikiLink
        ) {
            self.resolve_delims();
        }
        match tag {
            TagEnd::Paragraph => self.newline(),
            TagEnd::Heading(_) => self.end_heading(),
            TagEnd::CodeBlock => self.end_code_block(),
            TagEnd::HtmlBlock => {}
            TagEnd::BlockQuote | TagEnd::Item => {
                let empty = self.siblings.last() == Some(&Last::Nothing);
                if empty {
                    self.blank_line();
                }
                self.frames.pop();
                self.siblings.pop();
            }
            TagEnd::List(_) => {
                self.frames.pop();
                self.siblings.pop();
            }
            TagEnd::Emphasis | TagEnd::Strong => self.close_delim(),
            TagEnd::Link | TagEnd::Image | TagEnd::WikiLink => match self.closes.pop() {
                Some(Close::Suffix(suffix)) => self.write(&suffix),
                Some(Close::Silent) => self.silent = self.silent.saturating_sub(1),
                None => {}
            },
        }
    }

    fn mark_heading_multiline(&mut self) {
        if let Some(heading) = self.heading.as_mut().filter(|h| h.level <= 2) {
            heading.multiline = true;
        }
    }

    /// Headings that span several lines are written in setext form.
    fn end_heading(&mut self) {
        match self.heading.take() {
            Some(h) if h.multiline => {
                self.out.replace_range(h.marker..h.marker + usize::from(h.level) + 1, "");
                self.newline();
                self.write(if h.level == 1 { "===" } else { "---" });
                self.newline();
            }
            _ => self.newline(),
        }
    }

    fn open_delim(&mut self, width: usize) {
        self.write(&"**"[..width]);
        self.open_pairs.push(self.pairs.len());
        let open = self.out.len() - width;
        self.pairs.push(DelimPair { open, close: open, width, ch: None });
    }

    fn close_delim(&mut self) {
        let Some(idx) = self.open_pairs.pop() else {
            return;
        };
        let width = self.pairs[idx].width;
        self.write(&"**"[..width]);
        self.pairs[idx].close = self.out.len() - width;
    }

    /// Pick `*` or `_` for every delimiter pair of the finished leaf block.
    ///
    /// Pairs are visited in opener order, so every delimiter left of an
    /// opener is already decided. A pair takes `*` unless one of its runs
    /// touches a decided `*` run; then it takes `_` when the text around it
    /// lets `_` open and close.
    fn resolve_delims(&mut self) {
        if self.pairs.is_empty() {
            return;
        }
        let mut owner: FxHashMap<usize, usize> = FxHashMap::default();
        for (idx, pair) in self.pairs.iter().enumerate() {
            for k in 0..pair.width {
                owner.insert(pair.open + k, idx);
                owner.insert(pair.close + k, idx);
            }
        }
        for idx in 0..self.pairs.len() {
            let pair = &self.pairs[idx];
            let touching = [
                pair.open.checked_sub(1),
                Some(pair.open + pair.width),
                pair.close.checked_sub(1),
                Some(pair.close + pair.width),
            ];
            let clashes = |ch: u8| {
                touching
                    .iter()
                    .flatten()
                    .filter_map(|at| owner.get(at))
                    .any(|&other| other != idx && self.pairs[other].ch == Some(ch))
            };
            let underscore_fits = fits_underscore(self.out[..pair.open].chars().next_back())
                && fits_underscore(self.out[pair.close + pair.width..].chars().next());
            let ch = if !clashes(b'*') {
                b'*'
            } else if underscore_fits && !clashes(b'_') {
                b'_'
            } else {
                b'*'
            };
            self.pairs[idx].ch = Some(ch);
        }
        for pair in &self.pairs {
            if pair.ch == Some(b'_') {
                let run = &"__"[..pair.width];
                self.out.replace_range(pair.open..pair.open + pair.width, run);
                self.out.replace_range(pair.close..pair.close + pair.width, run);
            }
        }
        log::trace!("resolved {} emphasis pairs", self.pairs.len());
        self.pairs.clear();
        self.open_pairs.clear();
    }

    fn text(&mut self, text: &str) {
        if self.silent > 0 {
            return;
        }
        if let Some(code) = &mut self.code {
            code.body.push_str(text);
            return;
        }
        let mut escaped = String::with_capacity(text.len() + 4);
        escape_markdown_into(&mut escaped, text);
        self.write(&escaped);
    }

    fn inline_code(&mut self, code: &str) {
        let fence = "`".repeat(longest_run(code, b'`') + 1);
        let bytes = code.as_bytes();
        let pad = bytes.first() == Some(&b'`')
            || bytes.last() == Some(&b'`')
            || (bytes.len() >= 2
                && bytes[0] == b' '
                && bytes[bytes.len() - 1] == b' '
                && bytes.iter().any(|&b| b != b' '));
        self.write(&fence);
        if pad {
            self.write(" ");
        }
        self.write(code);
        if pad {
            self.write(" ");
        }
        self.write(&fence);
    }

    fn end_code_block(&mut self) {
        let Some(code) = self.code.take() else {
            return;
        };
        let Some(info) = code.info else {
            self.raw_lines(&code.body, true);
            return;
        };
        let ch = if info.contains('`') { '~' } else { '`' };
        let len = (longest_run(&code.body, ch as u8) + 1).max(3);
        let fence: String = std::iter::repeat_n(ch, len).collect();
        let mut open = fence.clone();
        escape_markdown_into(&mut open, &info);
        self.write(&open);
        self.newline();
        self.raw_lines(&code.body, false);
        self.write(&fence);
        self.newline();
    }

    /// Lines of code or HTML, written verbatim under the container prefix.
    fn raw_lines(&mut self, text: &str, indented: bool) {
        for line in text.split_inclusive('\n') {
            if line == "\n" && self.at_line_start {
                self.blank_line();
                continue;
            }
            if indented && self.at_line_start {
                self.write_prefix(false);
                self.out.push_str("    ");
            }
            self.write(line.strip_suffix('\n').unwrap_or(line));
            if line.ends_with('\n') {
                self.newline();
            }
        }
    }

    /// Separate a new block from its previous sibling.
    fn begin_block(&mut self, kind: Last) {
        self.resolve_delims();
        let previous = self.siblings.last().copied().unwrap_or(Last::Nothing);
        if previous != Last::Nothing {
            self.end_line();
            if !self.tight_context() {
                self.blank_line();
            }
        }
        if let Some(last) = self.siblings.last_mut() {
            *last = kind;
        }
    }

    /// Blocks directly inside the items of a tight list are separated by a
    /// single line break.
    fn tight_context(&self) -> bool {
        for frame in self.frames.iter().rev() {
            match frame {
                Frame::Item { .. } => continue,
                Frame::List { tight, .. } => return *tight,
                Frame::Quote => return false,
            }
        }
        false
    }

    fn end_line(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn blank_line(&mut self) {
        self.write_prefix(true);
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn write(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.at_line_start {
            self.write_prefix(false);
        }
        self.out.push_str(s);
    }

    fn write_prefix(&mut self, trim: bool) {
        let start = self.out.len();
        for frame in &mut self.frames {
            match frame {
                Frame::Quote => self.out.push_str("> "),
                Frame::List { .. } => {}
                Frame::Item { indent, marker } => match marker.take() {
                    Some(marker) => self.out.push_str(&marker),
                    None => self.out.extend(std::iter::repeat_n(' ', *indent)),
                },
            }
        }
        if trim {
            let kept = self.out[start..].trim_end().len();
            self.out.truncate(start + kept);
        }
        self.at_line_start = false;
    }
}

/// Render events back to normalized Markdown.
///
/// # Example
/// ```
/// let events = wikimark::parse("Plain *and* [[Linked|linked]]");
/// assert_eq!(wikimark::to_markdown(&events), "Plain *and* [[Linked|linked]]\n");
/// ```
pub fn to_markdown<'a, I, E>(events: I) -> String
where
    I: IntoIterator<Item = E>,
    E: std::borrow::Borrow<Event<'a>>,
{
    let mut writer = MarkdownWriter::new();
    for event in events {
        writer.write_event(event.borrow());
    }
    writer.into_string()
}

fn link_suffix(dest: &str, title: &str) -> String {
    let mut out = String::from("](");
    let mut escaped = String::with_capacity(dest.len());
    escape_markdown_into(&mut escaped, dest);
    if dest.is_empty() || dest.bytes().any(|b| b <= b' ') {
        out.push('<');
        out.push_str(&escaped);
        out.push('>');
    } else {
        out.push_str(&escaped);
    }
    if !title.is_empty() {
        let mut escaped = String::with_capacity(title.len());
        escape_markdown_into(&mut escaped, title);
        out.push_str(" \"");
        out.push_str(&escaped.replace('"', "\\\""));
        out.push('"');
    }
    out.push(')');
    out
}

/// `_` can open after, and close before, whitespace, punctuation or a line
/// edge.
fn fits_underscore(c: Option<char>) -> bool {
    c.is_none_or(|c| c.is_whitespace() || is_flank_punctuation(Some(c)))
}

fn longest_run(text: &str, ch: u8) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for &b in text.as_bytes() {
        if b == ch {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(input: &str) -> String {
        to_markdown(crate::parse(input))
    }

    #[test]
    fn test_paragraphs_and_headings() {
        assert_eq!(normalize("# A\nb\nc\n\nd"), "# A\n\nb\nc\n\nd\n");
    }

    #[test]
    fn test_escapes_text() {
        assert_eq!(normalize("1\\. not a list"), "1\\. not a list\n");
        assert_eq!(normalize("a &amp; b"), "a \\& b\n");
    }

    #[test]
    fn test_code_spans_and_blocks() {
        assert_eq!(normalize("`` a`b ``"), "``a`b``\n");
        assert_eq!(normalize("`` `a` ``"), "`` `a` ``\n");
        assert_eq!(normalize("~~~\n```\n~~~"), "````\n```\n````\n");
        assert_eq!(normalize("    code"), "    code\n");
    }

    #[test]
    fn test_lists() {
        assert_eq!(normalize("* a\n* b"), "- a\n- b\n");
        assert_eq!(normalize("1. a\n\n2. b"), "1. a\n\n2. b\n");
        assert_eq!(normalize("- a\n  - b"), "- a\n  - b\n");
    }

    #[test]
    fn test_quote() {
        assert_eq!(normalize("> a\n>\n> b"), "> a\n>\n> b\n");
    }

    #[test]
    fn test_touching_emphasis_switches_delimiter() {
        assert_eq!(normalize("_*a*_"), "*_a_*\n");
        assert_eq!(normalize("*a **b***"), "*a __b__*\n");
        assert_eq!(normalize("***a***"), "*__a__*\n");
        assert_eq!(normalize("*a*_b_"), "*a*_b_\n");
        assert_eq!(normalize("*[ *!***]"), "*\\[ _\\!_*\\*\\]\n");
    }

    #[test]
    fn test_separate_emphasis_keeps_star() {
        assert_eq!(normalize("_a_ and __b__"), "*a* and **b**\n");
        assert_eq!(normalize("a*b*c"), "a*b*c\n");
    }

    #[test]
    fn test_multi_line_heading_is_setext() {
        assert_eq!(normalize(":\n(\n-"), ":\n\\(\n---\n");
        assert_eq!(normalize("a\nb\n==="), "a\nb\n===\n");
        assert_eq!(normalize("> a\\\n> b\n> ---"), "> a\\\n> b\n> ---\n");
        assert_eq!(normalize("- a\n  b\n  ---"), "- a\n  b\n  ---\n");
        assert_eq!(normalize("a\n---"), "## a\n");
    }

    #[test]
    fn test_links() {
        assert_eq!(normalize("[a](</b c> \"t\")"), "[a](</b c> \"t\")\n");
        assert_eq!(normalize("<https://x.y>"), "<https://x.y>\n");
        assert_eq!(normalize("[[a]] [[b|c]]"), "[[a]] [[b|c]]\n");
    }
}
