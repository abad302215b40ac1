//! Emphasis and strong emphasis resolution.
//!
//! Delimiter runs are matched with the CommonMark delimiter-stack
//! algorithm, including the "multiple of 3" rule and per-bucket openers
//! bottoms so that unmatched closers are not rescanned. Each link text is
//! its own scope: emphasis never crosses a link boundary.

use smallvec::SmallVec;

use super::links::Link;
use super::marks::{flags, Mark};

/// Result of emphasis resolution for a delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmphasisMatch {
    /// Start position of opener delimiter(s).
    pub opener_start: u32,
    /// End position of opener delimiter(s).
    pub opener_end: u32,
    /// Start position of closer delimiter(s).
    pub closer_start: u32,
    /// End position of closer delimiter(s).
    pub closer_end: u32,
    /// Two delimiters on each side rather than one.
    pub strong: bool,
}

const NONE: usize = usize::MAX;

/// A live delimiter run. `start..end` shrinks as delimiters are used up:
/// openers from the right, closers from the left.
#[derive(Debug, Clone, Copy)]
struct Delim {
    start: u32,
    end: u32,
    ch: u8,
    orig_len: u32,
    can_open: bool,
    can_close: bool,
    prev: usize,
    next: usize,
}

impl Delim {
    #[inline]
    fn remaining(&self) -> u32 {
        self.end - self.start
    }
}

/// Resolve emphasis over the unconsumed `*` and `_` marks. `links` must be
/// sorted by start.
pub fn resolve_emphasis(marks: &[Mark], links: &[Link], out: &mut Vec<EmphasisMatch>) {
    out.clear();

    // (scope, mark index), scope being the innermost enclosing link text.
    let mut scoped: Vec<(usize, usize)> = Vec::new();
    let mut open_links: SmallVec<[usize; 4]> = SmallVec::new();
    let mut next_link = 0;
    for (i, mark) in marks.iter().enumerate() {
        if mark.is_consumed() || (mark.ch != b'*' && mark.ch != b'_') {
            continue;
        }
        while next_link < links.len() && links[next_link].text_start <= mark.pos {
            let link = &links[next_link];
            while open_links.last().is_some_and(|&l| links[l].text_end <= link.text_start) {
                open_links.pop();
            }
            open_links.push(next_link);
            next_link += 1;
        }
        while open_links.last().is_some_and(|&l| links[l].text_end <= mark.pos) {
            open_links.pop();
        }
        scoped.push((open_links.last().copied().unwrap_or(NONE), i));
    }
    if scoped.is_empty() {
        return;
    }
    scoped.sort_by_key(|&(scope, _)| scope);

    let mut delims = Vec::with_capacity(scoped.len());
    let mut group_start = 0;
    while group_start < scoped.len() {
        let scope = scoped[group_start].0;
        let group_end = scoped[group_start..]
            .iter()
            .position(|&(s, _)| s != scope)
            .map_or(scoped.len(), |n| group_start + n);
        delims.clear();
        for (k, &(_, i)) in scoped[group_start..group_end].iter().enumerate() {
            let mark = &marks[i];
            delims.push(Delim {
                start: mark.pos,
                end: mark.end,
                ch: mark.ch,
                orig_len: mark.len(),
                can_open: mark.has(flags::POTENTIAL_OPENER),
                can_close: mark.has(flags::POTENTIAL_CLOSER),
                prev: if k == 0 { NONE } else { k - 1 },
                next: if group_start + k + 1 == group_end { NONE } else { k + 1 },
            });
        }
        process_delims(&mut delims, out);
        group_start = group_end;
    }
}

fn unlink(delims: &mut [Delim], idx: usize) {
    let Delim { prev, next, .. } = delims[idx];
    if prev != NONE {
        delims[prev].next = next;
    }
    if next != NONE {
        delims[next].prev = prev;
    }
}

/// Match openers and closers within one scope.
fn process_delims(delims: &mut [Delim], out: &mut Vec<EmphasisMatch>) {
    // Indexed by [is `_`][can_open * 3 + orig_len % 3].
    let mut openers_bottom = [[NONE; 6]; 2];
    let mut closer = if delims.is_empty() { NONE } else { 0 };

    while closer != NONE {
        let c = delims[closer];
        if !c.can_close {
            closer = c.next;
            continue;
        }
        let bucket = usize::from(c.ch == b'_');
        let slot = usize::from(c.can_open) * 3 + (c.orig_len % 3) as usize;
        let bottom = openers_bottom[bucket][slot];

        let mut opener = c.prev;
        let mut found = false;
        while opener != NONE && opener != bottom {
            let o = delims[opener];
            let odd_match = (c.can_open || o.can_close)
                && c.orig_len % 3 != 0
                && (o.orig_len + c.orig_len) % 3 == 0;
            if o.ch == c.ch && o.can_open && !odd_match {
                found = true;
                break;
            }
            opener = o.prev;
        }

        if !found {
            openers_bottom[bucket][slot] = c.prev;
            if !c.can_open {
                unlink(delims, closer);
            }
            closer = c.next;
            continue;
        }

        let used = if c.remaining() >= 2 && delims[opener].remaining() >= 2 { 2 } else { 1 };
        let o = &mut delims[opener];
        o.end -= used;
        let (opener_start, opener_end) = (o.end, o.end + used);
        let opener_left = o.remaining();
        let cl = &mut delims[closer];
        let (closer_start, closer_end) = (cl.start, cl.start + used);
        cl.start += used;
        let closer_left = cl.remaining();

        out.push(EmphasisMatch {
            opener_start,
            opener_end,
            closer_start,
            closer_end,
            strong: used == 2,
        });

        // Delimiters between the pair can no longer match.
        delims[opener].next = closer;
        delims[closer].prev = opener;

        if opener_left == 0 {
            unlink(delims, opener);
        }
        if closer_left == 0 {
            let next = delims[closer].next;
            unlink(delims, closer);
            closer = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::marks::{collect_marks, MarkBuffer};

    fn resolve(text: &str) -> Vec<EmphasisMatch> {
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let mut out = Vec::new();
        resolve_emphasis(buffer.marks(), &[], &mut out);
        out.sort_by_key(|m| m.opener_start);
        out
    }

    fn spans(text: &str) -> Vec<(u32, u32, bool)> {
        resolve(text)
            .iter()
            .map(|m| (m.opener_start, m.closer_end, m.strong))
            .collect()
    }

    #[test]
    fn test_simple_emphasis() {
        assert_eq!(spans("*foo*"), vec![(0, 5, false)]);
        assert_eq!(spans("__foo__"), vec![(0, 7, true)]);
    }

    #[test]
    fn test_triple_delimiters() {
        // Strong inside emphasis.
        assert_eq!(spans("***foo***"), vec![(0, 9, false), (1, 8, true)]);
    }

    #[test]
    fn test_rule_of_three() {
        // `*foo**bar*`: the middle run may not close the first.
        assert_eq!(spans("*foo**bar*"), vec![(0, 10, false)]);
    }

    #[test]
    fn test_unbalanced_runs() {
        assert_eq!(spans("**foo*"), vec![(1, 6, false)]);
        assert_eq!(spans("*foo**"), vec![(0, 5, false)]);
    }

    #[test]
    fn test_mismatched_characters() {
        assert!(spans("*foo_").is_empty());
        assert!(spans("foo_bar_").is_empty());
    }

    #[test]
    fn test_nested_different_chars() {
        assert_eq!(spans("*a _b_ c*"), vec![(0, 9, false), (3, 6, false)]);
    }

    #[test]
    fn test_link_scopes() {
        use crate::inline::links::LinkTarget;
        use crate::Range;

        // `*a [b* c](d)`: the `*`s sit in different scopes.
        let text = "*a [b* c](d)";
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let link = Link {
            start: 3,
            text_start: 4,
            text_end: 8,
            end: 12,
            image: false,
            target: LinkTarget::Inline {
                dest: Range::new(10, 11),
                title: None,
            },
        };
        let mut out = Vec::new();
        resolve_emphasis(buffer.marks(), &[link], &mut out);
        assert!(out.is_empty());
    }
}
