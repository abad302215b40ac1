//! Link and image parsing.
//!
//! Handles:
//! - Inline links: `[text](url "title")`
//! - Reference links: `[text][label]`, `[label][]`, `[label]`
//! - Images: the same forms prefixed with `!`
//! - Autolinks: `<https://example.com>` and `<email@example.com>`
//!
//! The destination, title and label scanners are shared with link reference
//! definitions.

use smallvec::SmallVec;

use super::marks::{flags, Mark};
use crate::error::LimitKind;
use crate::link_ref::LinkRefStore;
use crate::{limits, LinkType, Range};

/// Where a resolved link points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Inline { dest: Range, title: Option<Range> },
    /// Index into the document's [`LinkRefStore`].
    Reference { def: u32, link_type: LinkType },
}

impl LinkTarget {
    pub fn link_type(&self) -> LinkType {
        match self {
            Self::Inline { .. } => LinkType::Inline,
            Self::Reference { link_type, .. } => *link_type,
        }
    }
}

/// A resolved link or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Start of the opening bracket (or `!` for images).
    pub start: u32,
    /// First byte of the link text.
    pub text_start: u32,
    /// Position of the closing `]`.
    pub text_end: u32,
    /// End of the entire link.
    pub end: u32,
    pub image: bool,
    pub target: LinkTarget,
}

/// Scanned link destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDest {
    /// Raw destination, without angle brackets.
    pub range: Range,
    /// Offset after the destination.
    pub end: usize,
    pub angled: bool,
}

/// Scanned link title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTitle {
    /// Raw title, without delimiters.
    pub range: Range,
    pub end: usize,
}

/// Skip spaces and tabs, at most one line ending, then spaces and tabs.
pub fn skip_spnl(text: &[u8], mut pos: usize) -> usize {
    while pos < text.len() && (text[pos] == b' ' || text[pos] == b'\t') {
        pos += 1;
    }
    if text.get(pos) == Some(&b'\n') {
        pos += 1;
        while pos < text.len() && (text[pos] == b' ' || text[pos] == b'\t') {
            pos += 1;
        }
    }
    pos
}

/// Scan a link label `[...]` at `start`. Returns the offset after `]`.
/// Unescaped brackets are not allowed inside.
pub fn scan_link_label(text: &[u8], start: usize) -> Option<usize> {
    if text.get(start) != Some(&b'[') {
        return None;
    }
    let mut pos = start + 1;
    while pos < text.len() {
        if pos - start - 1 > limits::MAX_LINK_LABEL_LEN {
            return None;
        }
        match text[pos] {
            b'\\' if pos + 1 < text.len() => pos += 2,
            b'[' => return None,
            b']' => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

/// Scan a link destination at `start`: `<...>` or a bare run with balanced
/// parentheses. A bare destination may be empty; callers decide.
pub fn scan_link_destination(text: &[u8], start: usize) -> Option<LinkDest> {
    let len = text.len();
    if text.get(start) == Some(&b'<') {
        let mut pos = start + 1;
        while pos < len {
            match text[pos] {
                b'>' => {
                    return Some(LinkDest {
                        range: Range::from_usize(start + 1, pos),
                        end: pos + 1,
                        angled: true,
                    });
                }
                b'<' | b'\n' => return None,
                b'\\' if pos + 1 < len && crate::escape::is_escapable(text[pos + 1]) => pos += 2,
                _ => pos += 1,
            }
        }
        return None;
    }

    let mut pos = start;
    let mut depth = 0usize;
    while pos < len {
        match text[pos] {
            b'\\' if pos + 1 < len && crate::escape::is_escapable(text[pos + 1]) => pos += 2,
            b'(' => {
                depth += 1;
                if depth > limits::MAX_LINK_PAREN_DEPTH {
                    return None;
                }
                pos += 1;
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                pos += 1;
            }
            b if b <= b' ' || b == 0x7f => break,
            _ => pos += 1,
        }
    }
    if depth != 0 {
        return None;
    }
    Some(LinkDest {
        range: Range::from_usize(start, pos),
        end: pos,
        angled: false,
    })
}

/// Scan a link title in `"..."`, `'...'` or `(...)` at `start`.
pub fn scan_link_title(text: &[u8], start: usize) -> Option<LinkTitle> {
    let open = *text.get(start)?;
    let close = match open {
        b'"' | b'\'' => open,
        b'(' => b')',
        _ => return None,
    };
    let mut pos = start + 1;
    while pos < text.len() {
        let b = text[pos];
        if b == b'\\' && pos + 1 < text.len() {
            pos += 2;
        } else if b == close {
            return Some(LinkTitle {
                range: Range::from_usize(start + 1, pos),
                end: pos + 1,
            });
        } else if open == b'(' && b == b'(' {
            return None;
        } else {
            pos += 1;
        }
    }
    None
}

/// Parse `(dest "title")` with `pos` at the `(`.
/// Returns destination, title and the offset after `)`.
fn parse_inline_tail(text: &[u8], pos: usize) -> Option<(Range, Option<Range>, usize)> {
    let dest_start = skip_spnl(text, pos + 1);
    if text.get(dest_start) == Some(&b')') {
        return Some((Range::empty_at(dest_start as u32), None, dest_start + 1));
    }
    let dest = scan_link_destination(text, dest_start)?;
    if dest.range.is_empty() && !dest.angled {
        return None;
    }
    let mut pos = skip_spnl(text, dest.end);
    let mut title = None;
    if pos > dest.end {
        if let Some(t) = scan_link_title(text, pos) {
            title = Some(t.range);
            pos = skip_spnl(text, t.end);
        }
    }
    (text.get(pos) == Some(&b')')).then_some((dest.range, title, pos + 1))
}

#[derive(Debug, Clone, Copy)]
struct Opener {
    pos: u32,
    text_start: u32,
    image: bool,
    active: bool,
    /// Another `[` was seen after this one.
    bracket_after: bool,
}

/// Resolve links and images over `marks` using the CommonMark bracket
/// stack. `wiki_starts` holds the (sorted) start offsets of resolved
/// wikilinks: reaching one deactivates the pending link openers, and a link
/// destination may not cover one.
///
/// Returns the offset at which the bracket depth limit was hit, if it was.
pub fn resolve_links(
    text: &[u8],
    marks: &mut [Mark],
    refs: &LinkRefStore,
    wiki_starts: &[u32],
    links: &mut Vec<Link>,
) -> Option<u32> {
    links.clear();
    let mut stack: SmallVec<[Opener; 8]> = SmallVec::new();
    let mut skip_until = 0u32;
    let mut wiki_idx = 0;
    let mut limit_hit = None;

    for i in 0..marks.len() {
        let mark = marks[i];
        if mark.pos < skip_until {
            marks[i].consume();
            continue;
        }
        if mark.is_consumed() || (mark.ch != b'[' && mark.ch != b']') {
            continue;
        }
        while wiki_idx < wiki_starts.len() && wiki_starts[wiki_idx] < mark.pos {
            for opener in stack.iter_mut().filter(|o| !o.image) {
                opener.active = false;
            }
            wiki_idx += 1;
        }

        if mark.ch == b'[' {
            if stack.len() >= limits::MAX_BRACKET_DEPTH {
                limit_hit.get_or_insert(mark.pos);
                log::debug!("{} reached at byte {}", LimitKind::BracketDepth, mark.pos);
                continue;
            }
            if let Some(top) = stack.last_mut() {
                top.bracket_after = true;
            }
            stack.push(Opener {
                pos: mark.pos,
                text_start: mark.end,
                image: mark.has(flags::IMAGE),
                active: true,
                bracket_after: false,
            });
            continue;
        }

        // Closing bracket.
        let Some(opener) = stack.pop() else {
            continue;
        };
        if !opener.active {
            continue;
        }
        let close = mark.pos as usize;
        let Some((end, target)) = match_link_tail(text, close, &opener, refs) else {
            continue;
        };
        let covers_wikilink = {
            let first = wiki_starts.partition_point(|&s| (s as usize) <= close);
            wiki_starts.get(first).is_some_and(|&s| (s as usize) < end)
        };
        if covers_wikilink {
            continue;
        }

        links.push(Link {
            start: opener.pos,
            text_start: opener.text_start,
            text_end: mark.pos,
            end: end as u32,
            image: opener.image,
            target,
        });
        marks[i].consume();
        skip_until = end as u32;

        // Links may not contain other links.
        if !opener.image {
            for o in stack.iter_mut().filter(|o| !o.image) {
                o.active = false;
            }
        }
    }

    links.sort_by_key(|l| l.start);
    limit_hit
}

/// Try the link forms that may follow the `]` at `close`, in order: inline,
/// full reference, collapsed, shortcut.
fn match_link_tail(
    text: &[u8],
    close: usize,
    opener: &Opener,
    refs: &LinkRefStore,
) -> Option<(usize, LinkTarget)> {
    let after = close + 1;
    if text.get(after) == Some(&b'(') {
        if let Some((dest, title, end)) = parse_inline_tail(text, after) {
            return Some((end, LinkTarget::Inline { dest, title }));
        }
    }

    let label_end = scan_link_label(text, after);
    let (raw_label, end, link_type) = match label_end {
        Some(label_end) if label_end - after > 2 => (
            &text[after + 1..label_end - 1],
            label_end,
            LinkType::Reference,
        ),
        Some(label_end) if !opener.bracket_after => (
            &text[opener.text_start as usize..close],
            label_end,
            LinkType::Collapsed,
        ),
        None if !opener.bracket_after => {
            (&text[opener.text_start as usize..close], after, LinkType::Shortcut)
        }
        _ => return None,
    };
    if raw_label.len() > limits::MAX_LINK_LABEL_LEN {
        return None;
    }
    let label = std::str::from_utf8(raw_label).ok()?;
    let def = refs.lookup(label)?;
    Some((end, LinkTarget::Reference { def: def as u32, link_type }))
}

/// A resolved autolink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autolink {
    /// Start position (the `<`).
    pub start: u32,
    /// End position (after the `>`).
    pub end: u32,
    /// The URL or email between the angle brackets.
    pub content: Range,
    pub is_email: bool,
}

/// Try to parse an autolink at `start` (a `<`).
pub fn try_parse_autolink(text: &[u8], start: usize) -> Option<Autolink> {
    if text.get(start) != Some(&b'<') {
        return None;
    }
    let content_start = start + 1;
    let rel = text[content_start..]
        .iter()
        .position(|&b| b == b'>' || b == b'<' || b <= b' ')?;
    let content_end = content_start + rel;
    if text[content_end] != b'>' {
        return None;
    }
    let content = &text[content_start..content_end];
    let is_email = if is_uri_autolink(content) {
        false
    } else if is_email_autolink(content) {
        true
    } else {
        return None;
    };
    Some(Autolink {
        start: start as u32,
        end: (content_end + 1) as u32,
        content: Range::from_usize(content_start, content_end),
        is_email,
    })
}

/// Scheme of 2-32 characters (letter first, then letters, digits, `+`, `-`,
/// `.`) followed by `:`. The caller already excluded spaces, `<` and `>`.
fn is_uri_autolink(content: &[u8]) -> bool {
    let Some(colon) = content.iter().position(|&b| b == b':') else {
        return false;
    };
    let scheme = &content[..colon];
    (2..=32).contains(&scheme.len())
        && scheme[0].is_ascii_alphabetic()
        && scheme
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

fn is_email_autolink(content: &[u8]) -> bool {
    let Some(at) = content.iter().position(|&b| b == b'@') else {
        return false;
    };
    let (local, domain) = (&content[..at], &content[at + 1..]);
    let local_ok = !local.is_empty()
        && local
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b".!#$%&'*+/=?^_`{|}~-".contains(&b));
    local_ok
        && domain.split(|&b| b == b'.').all(|label| {
            (1..=63).contains(&label.len())
                && label[0].is_ascii_alphanumeric()
                && label[label.len() - 1].is_ascii_alphanumeric()
                && label.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::marks::{collect_marks, MarkBuffer};
    use crate::link_ref::{normalize_label, LinkRefDef};

    fn resolve(text: &str, refs: &LinkRefStore) -> Vec<Link> {
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let mut links = Vec::new();
        resolve_links(text.as_bytes(), buffer.marks_mut(), refs, &[], &mut links);
        links
    }

    fn store(label: &str) -> LinkRefStore {
        let mut refs = LinkRefStore::new();
        refs.insert(
            normalize_label(label),
            LinkRefDef {
                dest: "/ref".to_string(),
                title: String::new(),
            },
        );
        refs
    }

    #[test]
    fn test_inline_link() {
        let text = "[text](https://example.com \"t\")";
        let links = resolve(text, &LinkRefStore::new());
        assert_eq!(links.len(), 1);
        let LinkTarget::Inline { dest, title } = links[0].target else {
            panic!("expected inline link");
        };
        assert_eq!(dest.slice_str(text), Some("https://example.com"));
        assert_eq!(title.and_then(|t| t.slice_str(text)), Some("t"));
        assert_eq!(links[0].end as usize, text.len());
    }

    #[test]
    fn test_image_and_empty_destination() {
        let links = resolve("![alt]()", &LinkRefStore::new());
        assert_eq!(links.len(), 1);
        assert!(links[0].image);
        assert_eq!(links[0].start, 0);
    }

    #[test]
    fn test_reference_forms() {
        let refs = store("Foo");
        let kinds = |text: &str| -> Vec<LinkType> {
            resolve(text, &refs).iter().map(|l| l.target.link_type()).collect()
        };
        assert_eq!(kinds("[x][foo]"), vec![LinkType::Reference]);
        assert_eq!(kinds("[foo][]"), vec![LinkType::Collapsed]);
        assert_eq!(kinds("[foo]"), vec![LinkType::Shortcut]);
        assert!(kinds("[x][bar]").is_empty());
        assert!(kinds("[bar]").is_empty());
    }

    #[test]
    fn test_links_do_not_nest() {
        let links = resolve("[a [b](/u) c](/v)", &LinkRefStore::new());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].start, 3);
    }

    #[test]
    fn test_wikilink_blocks_destination() {
        let text = "[a](b[[c]])";
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let mut links = Vec::new();
        resolve_links(text.as_bytes(), buffer.marks_mut(), &LinkRefStore::new(), &[5], &mut links);
        assert!(links.is_empty());
    }

    #[test]
    fn test_destination_scanner() {
        let d = scan_link_destination(b"a(b)c) x", 0).unwrap();
        assert_eq!(d.end, 5);
        assert!(scan_link_destination(b"a(b", 0).is_none());
        let d = scan_link_destination(b"<a b>", 0).unwrap();
        assert!(d.angled);
        assert_eq!(d.range, Range::new(1, 4));
        assert!(scan_link_destination(b"<a\nb>", 0).is_none());
    }

    #[test]
    fn test_title_scanner() {
        assert_eq!(scan_link_title(b"\"a\\\"b\"", 0).map(|t| t.end), Some(6));
        assert!(scan_link_title(b"(a(b)", 0).is_none());
        assert!(scan_link_title(b"'open", 0).is_none());
    }

    #[test]
    fn test_label_scanner() {
        assert_eq!(scan_link_label(b"[a\\]b]", 0), Some(6));
        assert_eq!(scan_link_label(b"[a[b]", 0), None);
        let long = format!("[{}]", "x".repeat(limits::MAX_LINK_LABEL_LEN + 1));
        assert_eq!(scan_link_label(long.as_bytes(), 0), None);
    }

    #[test]
    fn test_autolinks() {
        let al = try_parse_autolink(b"<https://example.com>", 0).unwrap();
        assert!(!al.is_email);
        assert_eq!(al.end, 21);
        let al = try_parse_autolink(b"<foo@bar.example.com>", 0).unwrap();
        assert!(al.is_email);
        assert!(try_parse_autolink(b"<not valid>", 0).is_none());
        assert!(try_parse_autolink(b"<m:abc>", 0).is_none());
        assert!(try_parse_autolink(b"<a+b:c>", 0).is_some());
    }
}
