//! Block-level parser for Markdown.
//!
//! The block parser is line-oriented and builds a [`Tree`] of:
//! - Block quotes, lists and list items
//! - Paragraphs and ATX/setext headings
//! - Thematic breaks
//! - Indented and fenced code blocks
//! - HTML blocks
//!
//! Link reference definitions are collected while paragraphs close.

pub mod html;
pub mod leaf;
mod parser;
pub mod tree;

pub use parser::{parse_blocks, BlockParser, Blocks};
pub use tree::{BlockKind, BlockNode, LeafText, Line, NodeId, Tree};
