//! Arena-backed block tree.
//!
//! Nodes are appended to a single `Vec` and refer to their children by
//! index. There are no parent links: the parser tracks the open path itself.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::Range;

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// List marker data shared by a list and its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListData {
    pub ordered: bool,
    /// Bullet character (`-`, `+`, `*`) or ordered delimiter (`.`, `)`).
    pub marker: u8,
    pub start: u64,
    /// Columns of indentation before the marker.
    pub marker_offset: usize,
    /// Marker width plus the spaces that follow it.
    pub padding: usize,
}

impl ListData {
    /// Items belong to the same list when type and marker agree.
    #[inline]
    pub fn matches(&self, other: &ListData) -> bool {
        self.ordered == other.ordered && self.marker == other.marker
    }
}

/// Opening fence of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub ch: u8,
    pub len: usize,
    /// Indentation of the opening fence, stripped from content lines.
    pub offset: usize,
    /// Raw info string, trimmed.
    pub info: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Document,
    BlockQuote,
    List { data: ListData, tight: bool },
    Item(ListData),
    Paragraph,
    Heading { level: u8 },
    ThematicBreak,
    IndentedCode,
    FencedCode(Fence),
    /// Raw HTML block, start condition 1-7.
    HtmlBlock(u8),
}

impl BlockKind {
    /// Whether a block of this kind may hold `child`.
    pub fn can_contain(&self, child: &BlockKind) -> bool {
        match self {
            Self::Document | Self::BlockQuote | Self::Item(_) => !matches!(child, Self::Item(_)),
            Self::List { .. } => matches!(child, Self::Item(_)),
            _ => false,
        }
    }

    /// Leaves that take raw content lines as-is.
    #[inline]
    pub fn accepts_lines(&self) -> bool {
        matches!(
            self,
            Self::Paragraph | Self::IndentedCode | Self::FencedCode(_) | Self::HtmlBlock(_)
        )
    }
}

/// One content line of a leaf block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Source bytes, excluding the line terminator.
    pub range: Range,
    /// Spaces owed by a tab that a container prefix consumed partially.
    pub virtual_spaces: u8,
}

#[derive(Debug, Clone)]
pub struct BlockNode {
    pub kind: BlockKind,
    pub children: Vec<NodeId>,
    pub lines: Vec<Line>,
    pub open: bool,
    pub last_line_blank: bool,
    /// Source bytes covered by the block.
    pub span: Range,
}

/// The parsed block structure of one document.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<BlockNode>,
}

impl Tree {
    /// A tree holding only the document root.
    pub fn new() -> Self {
        let mut tree = Self { nodes: Vec::with_capacity(16) };
        tree.push(BlockKind::Document, 0);
        tree
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &BlockNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut BlockNode {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &BlockKind {
        &self.nodes[id.index()].kind
    }

    fn push(&mut self, kind: BlockKind, start: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(BlockNode {
            kind,
            children: Vec::new(),
            lines: Vec::new(),
            open: true,
            last_line_blank: false,
            span: Range::empty_at(start as u32),
        });
        id
    }

    /// Create a node and append it to `parent`.
    pub fn append(&mut self, parent: NodeId, kind: BlockKind, start: usize) -> NodeId {
        let id = self.push(kind, start);
        self.nodes[parent.index()].children.push(id);
        id
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].children.last().copied()
    }

    /// Detach the last child of `parent` if it is `child`.
    pub fn remove_last_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.index()].children;
        if children.last() == Some(&child) {
            children.pop();
        }
    }

    /// Whether `id` or its trailing descendants (through lists and items)
    /// ended with a blank line.
    pub fn ends_with_blank_line(&self, mut id: NodeId) -> bool {
        loop {
            let node = self.node(id);
            if node.last_line_blank {
                return true;
            }
            match node.kind {
                BlockKind::List { .. } | BlockKind::Item(_) => match node.children.last() {
                    Some(&last) => id = last,
                    None => return false,
                },
                _ => return false,
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a span of the joined leaf text back to source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Offset of this segment in the joined text.
    pub text_start: u32,
    pub src: Range,
}

/// Inline content of a paragraph or heading: its lines joined with `\n`.
#[derive(Debug, Clone)]
pub struct LeafText<'a> {
    pub text: Cow<'a, str>,
    pub segments: SmallVec<[Segment; 4]>,
}

impl<'a> LeafText<'a> {
    /// Join `lines` of `input`. A single line borrows from the input.
    pub fn new(input: &'a str, lines: &[Line]) -> Self {
        let mut segments = SmallVec::new();
        let text = match lines {
            [] => Cow::Borrowed(""),
            [line] => {
                segments.push(Segment { text_start: 0, src: line.range });
                Cow::Borrowed(line.range.slice_str(input).unwrap_or_default())
            }
            _ => {
                let cap: usize = lines.iter().map(|l| l.range.len() as usize + 1).sum();
                let mut out = String::with_capacity(cap);
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    segments.push(Segment { text_start: out.len() as u32, src: line.range });
                    out.push_str(line.range.slice_str(input).unwrap_or_default());
                }
                Cow::Owned(out)
            }
        };
        Self { text, segments }
    }

    fn segment_for(&self, pos: u32) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.text_start <= pos);
        idx.checked_sub(1).map(|i| &self.segments[i])
    }

    /// Source range of a span of the joined text.
    pub fn source_range(&self, range: Range) -> Range {
        let Some(first) = self.segment_for(range.start) else {
            return range;
        };
        let start = first.src.start + (range.start - first.text_start);
        let end = if range.is_empty() {
            start
        } else {
            match self.segment_for(range.end - 1) {
                Some(last) => last.src.start + (range.end - last.text_start),
                None => start,
            }
        };
        Range::new(start.min(end), end.max(start))
    }

    /// Borrow from `input` when `range` lies inside one segment; copy
    /// otherwise.
    pub fn slice(&self, input: &'a str, range: Range) -> Cow<'a, str> {
        if let Cow::Borrowed(text) = self.text {
            return Cow::Borrowed(range.slice_str(text).unwrap_or_default());
        }
        if let Some(seg) = self.segment_for(range.start) {
            let seg_end = seg.text_start + seg.src.len();
            if range.end <= seg_end {
                let offset = seg.src.start + (range.start - seg.text_start);
                let src = Range::new(offset, offset + range.len());
                if let Some(s) = src.slice_str(input) {
                    return Cow::Borrowed(s);
                }
            }
        }
        Cow::Owned(range.slice_str(&self.text).unwrap_or_default().to_owned())
    }
}
