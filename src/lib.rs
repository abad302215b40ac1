//! wikimark: a CommonMark pull parser with wikilinks
//!
//! This crate turns Markdown into a flat stream of [`Event`]s, in the shape
//! pulldown-cmark popularised, with one extension: `[[target]]` and
//! `[[target|label]]` wikilinks.
//!
//! # Design Principles
//! - No AST handed to callers: events only
//! - No regex: byte-level scanning
//! - Hostile input degrades to text: nesting and mark counts are capped
//! - Events borrow from the input wherever the source text is contiguous
//!
//! # Example
//! ```
//! use wikimark::{Event, Parser, Tag, TagEnd};
//!
//! let events: Vec<Event> = Parser::new("**bold [[a|b]] text**").collect();
//! assert_eq!(events[1], Event::Start(Tag::Strong));
//! assert_eq!(events[3], Event::Start(Tag::WikiLink { target: "a".into(), label: "b".into() }));
//! assert_eq!(events[5], Event::End(TagEnd::WikiLink));
//! ```

pub mod block;
pub mod cursor;
pub mod error;
pub mod escape;
pub mod event;
pub mod inline;
pub mod limits;
pub mod link_ref;
pub mod range;
pub mod render;
pub mod stream;

// Re-export primary types
pub use error::{Error, LimitExceeded, LimitKind};
pub use event::{CodeBlockKind, Event, LinkType, Tag, TagEnd};
pub use range::Range;
pub use render::{to_markdown, MarkdownWriter};
pub use stream::{OffsetIter, Parser};

/// Parsing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Recognise `[[target]]` and `[[target|label]]`.
    pub wikilinks: bool,
    /// Allow raw inline and block HTML.
    pub allow_html: bool,
    /// Resolve link reference definitions and reference-style links.
    pub allow_link_refs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            wikilinks: true,
            allow_html: true,
            allow_link_refs: true,
        }
    }
}

/// Collect every event of `input`, parsed with default options.
///
/// # Example
/// ```
/// let events = wikimark::parse("# Hello\n\n[[World]]");
/// assert_eq!(events.len(), 8);
/// ```
pub fn parse(input: &str) -> Vec<Event<'_>> {
    Parser::new(input).collect()
}

/// Collect every event of `input`, failing if any structural guard was
/// tripped along the way. [`Parser`] itself never fails; it degrades the
/// offending construct to text instead.
///
/// # Example
/// ```
/// use wikimark::{parse_strict, Options};
///
/// let deep = ">".repeat(100);
/// assert!(parse_strict(&deep, &Options::default()).is_err());
/// assert!(parse_strict("> fine", &Options::default()).is_ok());
/// ```
pub fn parse_strict<'a>(input: &'a str, options: &Options) -> Result<Vec<Event<'a>>, Error> {
    let mut parser = Parser::new_ext(input, *options);
    let events: Vec<Event<'a>> = parser.by_ref().collect();
    if let Some(limit) = parser.limits_exceeded().first() {
        return Err(Error::Limit(*limit));
    }
    Ok(events)
}
