//! Resource-limit reporting.
//!
//! Markdown parsing cannot fail; the only caller-facing condition is a
//! tripped resource guard.

use std::fmt;

use crate::limits;

/// Which guard tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// Block containers nested deeper than [`limits::MAX_BLOCK_NESTING`].
    BlockNesting,
    /// More inline marks than [`limits::MAX_INLINE_MARKS`] in one span.
    InlineMarks,
    /// More unclosed link brackets than [`limits::MAX_BRACKET_DEPTH`].
    BracketDepth,
}

impl LimitKind {
    /// Configured bound for this guard.
    pub const fn limit(self) -> usize {
        match self {
            Self::BlockNesting => limits::MAX_BLOCK_NESTING,
            Self::InlineMarks => limits::MAX_INLINE_MARKS,
            Self::BracketDepth => limits::MAX_BRACKET_DEPTH,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BlockNesting => "block nesting depth",
            Self::InlineMarks => "inline delimiter count",
            Self::BracketDepth => "link bracket depth",
        })
    }
}

/// A guard that tripped during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} exceeded limit of {limit} at byte {offset}")]
pub struct LimitExceeded {
    pub kind: LimitKind,
    pub limit: usize,
    /// Source byte offset where the guard tripped.
    pub offset: usize,
}

impl LimitExceeded {
    pub fn new(kind: LimitKind, offset: usize) -> Self {
        Self {
            kind,
            limit: kind.limit(),
            offset,
        }
    }
}

/// Errors surfaced by [`parse_strict`](crate::parse_strict).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("resource limit reached: {0}")]
    Limit(#[from] LimitExceeded),
}
