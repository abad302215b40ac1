//! Block parser implementation.
//!
//! Works line by line. Each line first walks the open blocks from the root
//! and checks which of them it continues, then tries new block starts, and
//! finally lands as a lazy paragraph continuation or as content of the
//! deepest matched block.

use smallvec::SmallVec;

use super::html;
use super::leaf;
use super::tree::{BlockKind, Fence, LeafText, Line, ListData, NodeId, Tree};
use crate::cursor::{line_bounds, LineCursor};
use crate::error::{LimitExceeded, LimitKind};
use crate::link_ref::{parse_link_ref_def, LinkRefStore};
use crate::{limits, Options, Range};

/// Outcome of checking whether a line continues an open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continue {
    Matched,
    NotMatched,
    /// The line closed the block (a closing fence) and needs no more work.
    LineDone,
}

/// Outcome of trying block starts at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Start {
    None,
    Container,
    Leaf,
}

/// Result of block parsing.
#[derive(Debug, Clone)]
pub struct Blocks {
    pub tree: Tree,
    pub refs: LinkRefStore,
    pub limits: Vec<LimitExceeded>,
}

/// Block parser state.
pub struct BlockParser<'a> {
    input: &'a str,
    options: Options,
    tree: Tree,
    refs: LinkRefStore,
    limits: Vec<LimitExceeded>,
    /// Open blocks from the document root down to the tip.
    open: SmallVec<[NodeId; 16]>,
    /// Depth in `open` of the last block the current line continued.
    last_matched: usize,
    /// Every open block was continued by the current line.
    all_closed: bool,
    line_start: usize,
    /// End of the previous line's content.
    prev_line_end: usize,
    /// The current line opened a fence; its info string is not content.
    fence_opened: bool,
    /// Start of the last line that tripped the nesting guard.
    nesting_reported: Option<usize>,
}

impl<'a> BlockParser<'a> {
    /// Create a new block parser.
    pub fn new(input: &'a str, options: Options) -> Self {
        let tree = Tree::new();
        let mut open = SmallVec::new();
        open.push(tree.root());
        Self {
            input,
            options,
            tree,
            refs: LinkRefStore::new(),
            limits: Vec::new(),
            open,
            last_matched: 0,
            all_closed: true,
            line_start: 0,
            prev_line_end: 0,
            fence_opened: false,
            nesting_reported: None,
        }
    }

    /// Parse every line and close the remaining blocks.
    pub fn parse(mut self) -> Blocks {
        let bytes = self.input.as_bytes();
        let mut start = 0;
        while start < bytes.len() {
            let (end, next) = line_bounds(bytes, start);
            self.incorporate_line(start, end);
            self.prev_line_end = end;
            start = next;
        }
        while !self.open.is_empty() {
            self.close_tip(self.prev_line_end);
        }
        Blocks {
            tree: self.tree,
            refs: self.refs,
            limits: self.limits,
        }
    }

    #[inline]
    fn tip(&self) -> NodeId {
        self.open[self.open.len() - 1]
    }

    fn incorporate_line(&mut self, start: usize, end: usize) {
        let mut line = LineCursor::new(self.input.as_bytes(), start, end);
        self.line_start = start;
        self.fence_opened = false;

        let old_tip = self.open.len() - 1;
        let mut depth = 0;
        let mut blank = line.blank;
        while depth < old_tip {
            line.find_next_nonspace();
            blank = line.blank;
            match self.continue_block(self.open[depth + 1], &mut line) {
                Continue::Matched => depth += 1,
                Continue::NotMatched => break,
                Continue::LineDone => return,
            }
        }
        self.all_closed = depth == old_tip;
        self.last_matched = depth;

        let mut container = depth;
        let mut matched_leaf = {
            let kind = self.tree.kind(self.open[container]);
            kind.accepts_lines() && !matches!(kind, BlockKind::Paragraph)
        };
        while !matched_leaf {
            line.find_next_nonspace();
            blank = line.blank;
            let indented = line.indent >= 4;
            if !indented && !line.peek_nonspace().is_some_and(leaf::maybe_special) {
                line.advance_next_nonspace();
                break;
            }
            match self.try_starts(&mut line, container, blank) {
                Start::Container => container = self.open.len() - 1,
                Start::Leaf => {
                    container = self.open.len() - 1;
                    matched_leaf = true;
                }
                Start::None => {
                    line.advance_next_nonspace();
                    break;
                }
            }
        }

        let tip = self.tip();
        if !self.all_closed && !blank && matches!(self.tree.kind(tip), BlockKind::Paragraph) {
            // Lazy continuation.
            self.add_line(tip, &line);
            return;
        }

        self.close_unmatched();
        let container_id = self.open[container];
        if blank {
            if let Some(last) = self.tree.last_child(container_id) {
                self.tree.node_mut(last).last_line_blank = true;
            }
        }

        let kind = *self.tree.kind(container_id);
        let node = self.tree.node(container_id);
        let last_line_blank = blank
            && !(matches!(kind, BlockKind::BlockQuote | BlockKind::FencedCode(_))
                || (matches!(kind, BlockKind::Item(_))
                    && node.children.is_empty()
                    && node.span.start as usize >= start));
        for &id in &self.open[..=container] {
            self.tree.node_mut(id).last_line_blank = last_line_blank;
        }

        if kind.accepts_lines() {
            if !self.fence_opened {
                self.add_line(container_id, &line);
            }
            if let BlockKind::HtmlBlock(t @ 1..=5) = kind {
                if html::end_condition(t, line.rest()) {
                    self.close_tip(end);
                }
            }
        } else if line.offset < line.end && !blank {
            let id = self.add_child(BlockKind::Paragraph, line.next_nonspace);
            line.advance_next_nonspace();
            self.add_line(id, &line);
        }
    }

    fn continue_block(&mut self, id: NodeId, line: &mut LineCursor<'_>) -> Continue {
        let node = self.tree.node(id);
        let has_children = !node.children.is_empty();
        let kind = node.kind;
        match kind {
            BlockKind::Document | BlockKind::List { .. } => Continue::Matched,
            BlockKind::BlockQuote => {
                if line.indent < 4 && line.peek_nonspace() == Some(b'>') {
                    line.advance_next_nonspace();
                    line.advance_offset(1, false);
                    if matches!(line.byte_at(line.offset), Some(b' ' | b'\t')) {
                        line.advance_offset(1, true);
                    }
                    Continue::Matched
                } else {
                    Continue::NotMatched
                }
            }
            BlockKind::Item(data) => {
                if line.blank {
                    if !has_children {
                        return Continue::NotMatched;
                    }
                    line.advance_next_nonspace();
                    Continue::Matched
                } else if line.indent >= data.marker_offset + data.padding {
                    line.advance_offset(data.marker_offset + data.padding, true);
                    Continue::Matched
                } else {
                    Continue::NotMatched
                }
            }
            BlockKind::Heading { .. } | BlockKind::ThematicBreak => Continue::NotMatched,
            BlockKind::FencedCode(fence) => {
                if line.indent < 4
                    && line.peek_nonspace() == Some(fence.ch)
                    && leaf::fence_close(line.rest_from_nonspace(), fence.ch, fence.len)
                {
                    self.close_tip(line.end);
                    return Continue::LineDone;
                }
                let mut strip = fence.offset;
                while strip > 0 && matches!(line.byte_at(line.offset), Some(b' ' | b'\t')) {
                    line.advance_offset(1, true);
                    strip -= 1;
                }
                Continue::Matched
            }
            BlockKind::IndentedCode => {
                if line.indent >= 4 {
                    line.advance_offset(4, true);
                    Continue::Matched
                } else if line.blank {
                    line.advance_next_nonspace();
                    Continue::Matched
                } else {
                    Continue::NotMatched
                }
            }
            BlockKind::HtmlBlock(t) => {
                if line.blank && (t == 6 || t == 7) {
                    Continue::NotMatched
                } else {
                    Continue::Matched
                }
            }
            BlockKind::Paragraph => {
                if line.blank {
                    Continue::NotMatched
                } else {
                    Continue::Matched
                }
            }
        }
    }

    /// Try each block start in precedence order with `open[container]` as
    /// the current container.
    fn try_starts(&mut self, line: &mut LineCursor<'_>, container: usize, blank: bool) -> Start {
        let indented = line.indent >= 4;
        let container_kind = *self.tree.kind(self.open[container]);
        let tip_is_paragraph = matches!(self.tree.kind(self.tip()), BlockKind::Paragraph);
        let nns = line.next_nonspace;
        let rest = line.rest_from_nonspace();
        let first = rest.first().copied();

        if indented {
            if !tip_is_paragraph && !blank {
                line.advance_offset(4, true);
                self.close_unmatched();
                self.add_child(BlockKind::IndentedCode, line.offset);
                return Start::Leaf;
            }
            return Start::None;
        }

        if first == Some(b'>') && !self.nesting_exceeded(container, nns) {
            line.advance_next_nonspace();
            line.advance_offset(1, false);
            if matches!(line.byte_at(line.offset), Some(b' ' | b'\t')) {
                line.advance_offset(1, true);
            }
            self.close_unmatched();
            self.add_child(BlockKind::BlockQuote, nns);
            return Start::Container;
        }

        if let Some(h) = leaf::atx_heading(rest) {
            self.close_unmatched();
            let id = self.add_child(BlockKind::Heading { level: h.level }, nns);
            if h.content_end > h.content_start {
                self.tree.node_mut(id).lines.push(Line {
                    range: Range::from_usize(nns + h.content_start, nns + h.content_end),
                    virtual_spaces: 0,
                });
            }
            line.advance_offset(line.end - line.offset, false);
            return Start::Leaf;
        }

        if let Some(f) = leaf::fence_open(rest) {
            self.close_unmatched();
            let fence = Fence {
                ch: f.ch,
                len: f.len,
                offset: line.indent,
                info: Range::from_usize(nns + f.info_start, nns + f.info_end),
            };
            self.add_child(BlockKind::FencedCode(fence), nns);
            line.advance_next_nonspace();
            line.advance_offset(f.len, false);
            self.fence_opened = true;
            return Start::Leaf;
        }

        if self.options.allow_html && first == Some(b'<') {
            let interrupts = matches!(container_kind, BlockKind::Paragraph)
                || (!self.all_closed && !blank && tip_is_paragraph);
            if let Some(t) = html::start_condition(rest, interrupts) {
                self.close_unmatched();
                self.add_child(BlockKind::HtmlBlock(t), line.offset);
                return Start::Leaf;
            }
        }

        if matches!(container_kind, BlockKind::Paragraph) {
            if let Some(level) = leaf::setext_underline(rest) {
                self.close_unmatched();
                let para = self.open[container];
                self.strip_link_refs(para);
                if !self.tree.node(para).lines.is_empty() {
                    self.tree.node_mut(para).kind = BlockKind::Heading { level };
                    log::trace!("setext heading level {level} at {}", self.line_start);
                    line.advance_offset(line.end - line.offset, false);
                    return Start::Leaf;
                }
            }
        }

        if leaf::thematic_break(rest) {
            self.close_unmatched();
            self.add_child(BlockKind::ThematicBreak, nns);
            line.advance_offset(line.end - line.offset, false);
            return Start::Leaf;
        }

        if let Some(marker) = leaf::list_marker(rest) {
            let interrupts = matches!(container_kind, BlockKind::Paragraph);
            let empty = rest[marker.width..].iter().all(|&b| b == b' ' || b == b'\t');
            if !(interrupts && ((marker.ordered && marker.start != 1) || empty))
                && !self.nesting_exceeded(container, nns)
            {
                let marker_offset = line.indent;
                line.advance_next_nonspace();
                line.advance_offset(marker.width, true);
                let (spaces_offset, spaces_column) = (line.offset, line.column);
                loop {
                    line.advance_offset(1, true);
                    if line.column - spaces_column >= 5
                        || !matches!(line.byte_at(line.offset), Some(b' ' | b'\t'))
                    {
                        break;
                    }
                }
                let blank_item = line.byte_at(line.offset).is_none();
                let spaces_after = line.column - spaces_column;
                let padding = if spaces_after >= 5 || spaces_after < 1 || blank_item {
                    line.reset_to(spaces_offset, spaces_column);
                    if matches!(line.byte_at(line.offset), Some(b' ' | b'\t')) {
                        line.advance_offset(1, true);
                    }
                    marker.width + 1
                } else {
                    marker.width + spaces_after
                };

                let data = ListData {
                    ordered: marker.ordered,
                    marker: marker.marker,
                    start: marker.start,
                    marker_offset,
                    padding,
                };
                self.close_unmatched();
                let continues_list = matches!(
                    self.tree.kind(self.tip()),
                    BlockKind::List { data: d, .. } if d.matches(&data)
                );
                if !continues_list {
                    self.add_child(BlockKind::List { data, tight: true }, nns);
                }
                self.add_child(BlockKind::Item(data), nns);
                return Start::Container;
            }
        }

        Start::None
    }

    /// Refuse a new container below `open[container]` once nesting reaches
    /// the limit. Reported once per line.
    fn nesting_exceeded(&mut self, container: usize, offset: usize) -> bool {
        if container + 2 <= limits::MAX_BLOCK_NESTING {
            return false;
        }
        if self.nesting_reported != Some(self.line_start) {
            self.nesting_reported = Some(self.line_start);
            log::debug!("{} reached at byte {offset}", LimitKind::BlockNesting);
            self.limits.push(LimitExceeded::new(LimitKind::BlockNesting, offset));
        }
        true
    }

    /// Close the blocks the current line did not continue.
    fn close_unmatched(&mut self) {
        if self.all_closed {
            return;
        }
        while self.open.len() > self.last_matched + 1 {
            self.close_tip(self.prev_line_end);
        }
        self.all_closed = true;
    }

    /// Append a block, closing the tip until it can hold the new kind.
    fn add_child(&mut self, kind: BlockKind, start: usize) -> NodeId {
        while self.open.len() > 1 && !self.tree.kind(self.tip()).can_contain(&kind) {
            self.close_tip(self.prev_line_end);
        }
        let id = self.tree.append(self.tip(), kind, start);
        log::trace!("open {kind:?} at {start}");
        self.open.push(id);
        id
    }

    fn add_line(&mut self, id: NodeId, line: &LineCursor<'_>) {
        let mut offset = line.offset;
        let mut virtual_spaces = 0;
        if line.partially_consumed_tab {
            offset += 1;
            virtual_spaces = line.pending_tab_columns() as u8;
        }
        let node = self.tree.node_mut(id);
        if matches!(node.kind, BlockKind::Paragraph) {
            let bytes = self.input.as_bytes();
            while offset < line.end && matches!(bytes[offset], b' ' | b'\t') {
                offset += 1;
            }
            virtual_spaces = 0;
        }
        node.lines.push(Line {
            range: Range::from_usize(offset.min(line.end), line.end),
            virtual_spaces,
        });
    }

    fn close_tip(&mut self, end: usize) {
        let Some(id) = self.open.pop() else {
            return;
        };
        self.finalize(id, end);
    }

    fn finalize(&mut self, id: NodeId, end: usize) {
        {
            let node = self.tree.node_mut(id);
            node.open = false;
            node.span.end = (end as u32).max(node.span.start);
            log::trace!("close {:?} at {}..{}", node.kind, node.span.start, node.span.end);
        }

        match *self.tree.kind(id) {
            BlockKind::Paragraph => {
                self.strip_link_refs(id);
                self.trim_last_line(id);
                if self.tree.node(id).lines.is_empty() {
                    if let Some(&parent) = self.open.last() {
                        self.tree.remove_last_child(parent, id);
                    }
                }
            }
            BlockKind::Heading { .. } => self.trim_last_line(id),
            BlockKind::List { data, .. } => {
                let tight = self.list_is_tight(id);
                self.tree.node_mut(id).kind = BlockKind::List { data, tight };
            }
            BlockKind::IndentedCode | BlockKind::HtmlBlock(_) => {
                let bytes = self.input.as_bytes();
                let lines = &mut self.tree.node_mut(id).lines;
                while lines
                    .last()
                    .is_some_and(|l| l.range.slice(bytes).iter().all(|&b| b == b' ' || b == b'\t'))
                {
                    lines.pop();
                }
            }
            _ => {}
        }
    }

    /// A list is loose when a blank line separates two of its items or two
    /// direct children of an item.
    fn list_is_tight(&self, list: NodeId) -> bool {
        let items = &self.tree.node(list).children;
        for (i, &item) in items.iter().enumerate() {
            let item_has_next = i + 1 < items.len();
            if item_has_next && self.tree.ends_with_blank_line(item) {
                return false;
            }
            let children = &self.tree.node(item).children;
            for (j, &child) in children.iter().enumerate() {
                let child_has_next = j + 1 < children.len();
                if (item_has_next || child_has_next) && self.tree.ends_with_blank_line(child) {
                    return false;
                }
            }
        }
        true
    }

    fn trim_last_line(&mut self, id: NodeId) {
        let bytes = self.input.as_bytes();
        if let Some(last) = self.tree.node_mut(id).lines.last_mut() {
            let mut end = last.range.end as usize;
            while end > last.range.start as usize && matches!(bytes[end - 1], b' ' | b'\t') {
                end -= 1;
            }
            last.range.end = end as u32;
        }
    }

    /// Move link reference definitions at the start of a paragraph into the
    /// store, dropping the lines they occupied.
    fn strip_link_refs(&mut self, id: NodeId) {
        if !self.options.allow_link_refs {
            return;
        }
        let node = self.tree.node(id);
        let Some(first) = node.lines.first() else {
            return;
        };
        if self.input.as_bytes().get(first.range.start as usize) != Some(&b'[') {
            return;
        }

        let leaf = LeafText::new(self.input, &node.lines);
        let text: &str = &leaf.text;
        let mut consumed = 0;
        while text[consumed..].starts_with('[') {
            let Some(parsed) = parse_link_ref_def(&text[consumed..]) else {
                break;
            };
            log::trace!("link reference definition [{}]", parsed.label);
            self.refs.insert(parsed.label, parsed.def);
            consumed += parsed.consumed;
        }
        if consumed == 0 {
            return;
        }

        let lines = &mut self.tree.node_mut(id).lines;
        let mut pos = 0;
        let mut covered = 0;
        for line in lines.iter() {
            let len = line.range.len() as usize;
            if pos + len > consumed {
                break;
            }
            covered += 1;
            pos += len + 1;
        }
        lines.drain(..covered);
    }
}

/// Parse `input` into a block tree.
pub fn parse_blocks(input: &str, options: Options) -> Blocks {
    BlockParser::new(input, options).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Blocks {
        parse_blocks(input, Options::default())
    }

    fn kinds(blocks: &Blocks, id: NodeId) -> Vec<BlockKind> {
        blocks
            .tree
            .node(id)
            .children
            .iter()
            .map(|&c| *blocks.tree.kind(c))
            .collect()
    }

    fn line_texts<'a>(input: &'a str, blocks: &Blocks, id: NodeId) -> Vec<&'a str> {
        blocks
            .tree
            .node(id)
            .lines
            .iter()
            .map(|l| l.range.slice_str(input).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let input = "# Title #\n\nfirst\n  second\n\nSetext\n===\n";
        let blocks = parse(input);
        let root = blocks.tree.root();
        assert_eq!(
            kinds(&blocks, root),
            vec![
                BlockKind::Heading { level: 1 },
                BlockKind::Paragraph,
                BlockKind::Heading { level: 1 },
            ]
        );
        let children = &blocks.tree.node(root).children;
        assert_eq!(line_texts(input, &blocks, children[0]), vec!["Title"]);
        assert_eq!(line_texts(input, &blocks, children[1]), vec!["first", "second"]);
        assert_eq!(line_texts(input, &blocks, children[2]), vec!["Setext"]);
    }

    #[test]
    fn test_fenced_code_keeps_info_and_lines() {
        let input = "  ```rust\n  let x;\n    y\n  ```\nafter";
        let blocks = parse(input);
        let root = blocks.tree.root();
        let code = blocks.tree.node(root).children[0];
        let BlockKind::FencedCode(fence) = *blocks.tree.kind(code) else {
            panic!("expected fenced code");
        };
        assert_eq!(fence.info.slice_str(input), Some("rust"));
        assert_eq!(line_texts(input, &blocks, code), vec!["let x;", "  y"]);
        assert_eq!(kinds(&blocks, root)[1], BlockKind::Paragraph);
    }

    #[test]
    fn test_blockquote_lazy_continuation() {
        let input = "> quote\nlazy\n\nnext";
        let blocks = parse(input);
        let root = blocks.tree.root();
        assert_eq!(kinds(&blocks, root), vec![BlockKind::BlockQuote, BlockKind::Paragraph]);
        let quote = blocks.tree.node(root).children[0];
        let para = blocks.tree.node(quote).children[0];
        assert_eq!(line_texts(input, &blocks, para), vec!["quote", "lazy"]);
    }

    #[test]
    fn test_list_tightness() {
        let tight = parse("- a\n- b\n");
        let root = tight.tree.root();
        assert!(matches!(kinds(&tight, root)[0], BlockKind::List { tight: true, .. }));

        let loose = parse("- a\n\n- b\n");
        let root = loose.tree.root();
        assert!(matches!(kinds(&loose, root)[0], BlockKind::List { tight: false, .. }));

        // Trailing blank lines do not loosen a list.
        let trailing = parse("1. a\n2. b\n\n\nafter");
        let root = trailing.tree.root();
        assert!(matches!(
            kinds(&trailing, root)[0],
            BlockKind::List { tight: true, data: ListData { ordered: true, .. } }
        ));
    }

    #[test]
    fn test_list_item_padding() {
        let input = "-     indented code\n\n10.  ten";
        let blocks = parse(input);
        let root = blocks.tree.root();
        let list = blocks.tree.node(root).children[0];
        let item = blocks.tree.node(list).children[0];
        // Five spaces after the marker: content is indented code.
        assert_eq!(kinds(&blocks, item), vec![BlockKind::IndentedCode]);
        let BlockKind::Item(data) = *blocks.tree.kind(item) else {
            panic!("expected item");
        };
        assert_eq!(data.padding, 2);
    }

    #[test]
    fn test_ordered_list_interrupting_paragraph() {
        let blocks = parse("text\n2. not a list\n");
        let root = blocks.tree.root();
        assert_eq!(kinds(&blocks, root), vec![BlockKind::Paragraph]);

        let blocks = parse("text\n1. a list\n");
        let root = blocks.tree.root();
        assert!(matches!(kinds(&blocks, root)[1], BlockKind::List { .. }));
    }

    #[test]
    fn test_link_reference_definitions_are_removed() {
        let input = "[foo]: /url \"title\"\n\n[foo]\n";
        let blocks = parse(input);
        let root = blocks.tree.root();
        assert_eq!(kinds(&blocks, root), vec![BlockKind::Paragraph]);
        let idx = blocks.refs.lookup("FOO").unwrap();
        assert_eq!(blocks.refs.get(idx).unwrap().dest, "/url");
    }

    #[test]
    fn test_html_block_end_conditions() {
        let input = "<div>\nhi\n\npara\n<!-- a\nb -->\nafter";
        let blocks = parse(input);
        let root = blocks.tree.root();
        assert_eq!(
            kinds(&blocks, root),
            vec![
                BlockKind::HtmlBlock(6),
                BlockKind::Paragraph,
                BlockKind::HtmlBlock(2),
                BlockKind::Paragraph,
            ]
        );
    }

    #[test]
    fn test_html_disabled() {
        let blocks = parse_blocks(
            "<div>\n",
            Options {
                allow_html: false,
                ..Options::default()
            },
        );
        let root = blocks.tree.root();
        assert_eq!(kinds(&blocks, root), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn test_tab_virtual_spaces() {
        let input = ">\t\tfoo";
        let blocks = parse(input);
        let root = blocks.tree.root();
        let quote = blocks.tree.node(root).children[0];
        let code = blocks.tree.node(quote).children[0];
        assert_eq!(*blocks.tree.kind(code), BlockKind::IndentedCode);
        let line = blocks.tree.node(code).lines[0];
        assert_eq!(line.virtual_spaces, 2);
        assert_eq!(line.range.slice_str(input), Some("foo"));
    }

    #[test]
    fn test_nesting_limit() {
        let input = "> ".repeat(limits::MAX_BLOCK_NESTING + 8) + "deep";
        let blocks = parse(&input);
        assert_eq!(blocks.limits.len(), 1);
        assert_eq!(blocks.limits[0].kind, LimitKind::BlockNesting);

        let mut depth = 0;
        let mut id = blocks.tree.root();
        while let Some(&child) = blocks.tree.node(id).children.first() {
            if *blocks.tree.kind(child) != BlockKind::BlockQuote {
                break;
            }
            depth += 1;
            id = child;
        }
        assert!(depth < limits::MAX_BLOCK_NESTING);
    }
}
