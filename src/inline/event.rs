//! Inline-level event types.

use super::links::LinkTarget;
use crate::Range;

/// Events emitted by the inline parser. Ranges index the leaf text handed
/// to [`InlineParser::parse`](super::InlineParser::parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineEvent {
    /// Plain text; entities are still undecoded.
    Text(Range),

    /// Backslash escape: the escaped byte.
    Escaped(u8),

    /// Raw code span content between the backtick runs.
    Code(Range),

    EmphasisStart,
    EmphasisEnd,
    StrongStart,
    StrongEnd,

    /// Start of a link; the link text follows.
    LinkStart { target: LinkTarget },
    LinkEnd,

    /// Start of an image; the alt text follows.
    ImageStart { target: LinkTarget },
    ImageEnd,

    /// Autolink `<url>` or `<email>`.
    Autolink { url: Range, is_email: bool },

    /// Raw inline HTML.
    Html(Range),

    SoftBreak,

    /// Two or more trailing spaces, or a backslash, before a line ending.
    HardBreak,

    /// `[[target]]` or `[[target|label]]`, raw.
    WikiLink { target: Range, label: Option<Range> },
}
