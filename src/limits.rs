//! DoS prevention constants.
//!
//! These limits keep pathological inputs from causing quadratic time or
//! unbounded stack growth. Tripping one never aborts a parse: the offending
//! construct degrades to literal text and a [`LimitExceeded`] is recorded.
//!
//! [`LimitExceeded`]: crate::LimitExceeded

/// Maximum nesting depth for block containers (lists, items, blockquotes).
pub const MAX_BLOCK_NESTING: usize = 32;

/// Maximum number of unclosed `[` / `![` openers in one inline span.
pub const MAX_BRACKET_DEPTH: usize = 32;

/// Maximum number of marks collected during inline parsing.
pub const MAX_INLINE_MARKS: usize = 4096;

/// Maximum backtick run length for code spans (prevents O(n^2) matching).
/// Longer runs are treated as literal text.
pub const MAX_CODE_SPAN_BACKTICKS: usize = 32;

/// Maximum parentheses nesting in link destinations (CommonMark allows 32).
pub const MAX_LINK_PAREN_DEPTH: usize = 32;

/// Maximum digits in ordered list marker (prevents big-integer parsing).
pub const MAX_LIST_MARKER_DIGITS: usize = 9;

/// Maximum length of a link label, in bytes.
pub const MAX_LINK_LABEL_LEN: usize = 999;

/// Maximum content length between `[[` and `]]`.
pub const MAX_WIKILINK_LEN: usize = 1024;
