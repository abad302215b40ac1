//! Wikilinks: `[[target]]` and `[[target|label]]`.
//!
//! Resolved after atomic spans and before standard links, so a `[[` claims
//! its brackets first. Matching is innermost-first: a closer pairs with the
//! most recent opener, and a resolved wikilink drops every opener before it,
//! so wikilinks never nest.

use smallvec::SmallVec;

use super::code_span::AtomicSpan;
use super::marks::Mark;
use crate::{limits, Range};

/// A resolved wikilink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WikiLink {
    /// Offset of the opening `[[`.
    pub start: u32,
    /// Offset after the closing `]]`.
    pub end: u32,
    /// Raw target, before any `|`.
    pub target: Range,
    /// Raw label after the first unescaped `|`, if any.
    pub label: Option<Range>,
}

#[derive(Debug, Clone, Copy)]
struct Opener {
    /// Offset of the first of the two brackets.
    pos: u32,
    /// Mark indices of the two brackets.
    marks: [usize; 2],
}

/// Find wikilinks among the bracket marks of `text`, consume the marks they
/// cover and drop atomic spans inside them.
pub fn resolve_wikilinks(
    text: &[u8],
    marks: &mut [Mark],
    spans: &mut Vec<AtomicSpan>,
    out: &mut Vec<WikiLink>,
) {
    out.clear();
    let mut openers: SmallVec<[Opener; 4]> = SmallVec::new();
    let mut i = 0;

    while i < marks.len() {
        let mark = marks[i];
        if mark.is_consumed() || (mark.ch != b'[' && mark.ch != b']') {
            i += 1;
            continue;
        }
        // Collect a run of adjacent bracket marks of the same kind.
        let mut j = i + 1;
        while j < marks.len()
            && marks[j].ch == mark.ch
            && !marks[j].is_consumed()
            && marks[j].bracket_pos() == marks[j - 1].bracket_pos() + 1
            && !marks[j].has(super::marks::flags::IMAGE)
        {
            j += 1;
        }
        let run = j - i;
        if run >= 2 {
            if mark.ch == b'[' {
                openers.push(Opener {
                    pos: marks[j - 2].bracket_pos(),
                    marks: [j - 2, j - 1],
                });
            } else if let Some(opener) = openers.pop() {
                let closer = mark.pos;
                if let Some(link) = build(text, opener, closer) {
                    log::trace!("wikilink at {}..{}", link.start, link.end);
                    for idx in opener.marks {
                        marks[idx].consume();
                    }
                    out.push(link);
                    openers.clear();
                } else {
                    log::debug!("rejected wikilink candidate at byte {}", opener.pos);
                }
            }
        }
        i = j;
    }

    if out.is_empty() {
        return;
    }
    for mark in marks.iter_mut() {
        let pos = mark.pos;
        if out.iter().any(|w| pos >= w.start && pos < w.end) {
            mark.consume();
        }
    }
    spans.retain(|s| !out.iter().any(|w| s.start >= w.start && s.end <= w.end));
}

/// Validate the content between `[[` at `opener.pos` and `]]` at `closer`.
fn build(text: &[u8], opener: Opener, closer: u32) -> Option<WikiLink> {
    let content_start = opener.pos as usize + 2;
    let content_end = closer as usize;
    if content_end < content_start || content_end - content_start > limits::MAX_WIKILINK_LEN {
        return None;
    }
    let content = &text[content_start..content_end];
    if memchr::memchr2(b'\n', b'\r', content).is_some() {
        return None;
    }

    let split = unescaped_pipe(content);
    let target_end = split.map_or(content_end, |p| content_start + p);
    let target = &text[content_start..target_end];
    if target.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    let label = split.map(|p| Range::from_usize(content_start + p + 1, content_end));

    Some(WikiLink {
        start: opener.pos,
        end: closer + 2,
        target: Range::from_usize(content_start, target_end),
        label,
    })
}

/// Offset of the first `|` not preceded by a backslash escape.
fn unescaped_pipe(content: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos < content.len() {
        match content[pos] {
            b'\\' => pos += 2,
            b'|' => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}
