//! Code spans, autolinks and raw inline HTML.
//!
//! These spans are atomic: nothing inside them is parsed further. They are
//! resolved together in one left-to-right pass so that whichever construct
//! starts first wins. Backtick runs must match exactly.

use super::html::parse_inline_html;
use super::links::try_parse_autolink;
use super::marks::{flags, Mark};
use crate::{limits, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Code span; `content` lies between the backtick runs.
    Code { content: Range },
    Autolink { content: Range, is_email: bool },
    Html,
}

/// A resolved atomic span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicSpan {
    pub start: u32,
    pub end: u32,
    pub kind: SpanKind,
}

impl AtomicSpan {
    #[inline]
    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }
}

/// Resolve atomic spans and flag every mark they cover as consumed.
pub fn resolve_spans(text: &[u8], marks: &mut [Mark], allow_html: bool, spans: &mut Vec<AtomicSpan>) {
    spans.clear();
    // A failed search for a closer of length n fails for every later opener
    // of the same length as well.
    let mut no_closer_for_len = [false; limits::MAX_CODE_SPAN_BACKTICKS + 1];
    let mut claimed_until = 0u32;

    for i in 0..marks.len() {
        let mark = marks[i];
        if mark.pos < claimed_until {
            continue;
        }
        let span = match mark.ch {
            b'`' => code_span_at(marks, i, &mut no_closer_for_len),
            b'<' => autolink_or_html_at(text, mark.pos as usize, allow_html),
            _ => None,
        };
        if let Some(span) = span {
            claimed_until = span.end;
            spans.push(span);
        }
    }

    consume_covered(marks, spans);
}

fn code_span_at(
    marks: &[Mark],
    i: usize,
    no_closer_for_len: &mut [bool; limits::MAX_CODE_SPAN_BACKTICKS + 1],
) -> Option<AtomicSpan> {
    let opener = marks[i];
    // An escaped run may only open with the backticks after the escaped one.
    let open_start = if opener.has(flags::ESCAPED) { opener.pos + 1 } else { opener.pos };
    let len = (opener.end - open_start) as usize;
    if len == 0 || len > limits::MAX_CODE_SPAN_BACKTICKS || no_closer_for_len[len] {
        return None;
    }
    let closer = marks[i + 1..]
        .iter()
        .find(|m| m.ch == b'`' && m.len() as usize == len);
    match closer {
        Some(closer) => Some(AtomicSpan {
            start: open_start,
            end: closer.end,
            kind: SpanKind::Code {
                content: Range::new(opener.end, closer.pos),
            },
        }),
        None => {
            no_closer_for_len[len] = true;
            None
        }
    }
}

fn autolink_or_html_at(text: &[u8], pos: usize, allow_html: bool) -> Option<AtomicSpan> {
    if let Some(al) = try_parse_autolink(text, pos) {
        return Some(AtomicSpan {
            start: al.start,
            end: al.end,
            kind: SpanKind::Autolink {
                content: al.content,
                is_email: al.is_email,
            },
        });
    }
    if !allow_html {
        return None;
    }
    parse_inline_html(text, pos).map(|end| AtomicSpan {
        start: pos as u32,
        end: end as u32,
        kind: SpanKind::Html,
    })
}

/// Flag marks that start inside one of `spans` (sorted, disjoint).
pub fn consume_covered(marks: &mut [Mark], spans: &[AtomicSpan]) {
    let mut s = 0;
    for mark in marks.iter_mut() {
        while s < spans.len() && spans[s].end <= mark.pos {
            s += 1;
        }
        let Some(span) = spans.get(s) else {
            break;
        };
        // Escaped closing runs start one byte before the span they close.
        if mark.pos >= span.start || (mark.end > span.start && mark.ch == b'`') {
            mark.consume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::marks::{collect_marks, MarkBuffer};

    fn spans_of(text: &str) -> (Vec<AtomicSpan>, Vec<Mark>) {
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let mut spans = Vec::new();
        resolve_spans(text.as_bytes(), buffer.marks_mut(), true, &mut spans);
        (spans, buffer.marks().to_vec())
    }

    fn content(text: &str, span: &AtomicSpan) -> String {
        match span.kind {
            SpanKind::Code { content } => content.slice_str(text).unwrap_or_default().to_string(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_simple_code_span() {
        let text = "hello `code` world";
        let (spans, _) = spans_of(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(content(text, &spans[0]), "code");
    }

    #[test]
    fn test_double_backtick() {
        let text = "``code with ` backtick``";
        let (spans, _) = spans_of(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(content(text, &spans[0]), "code with ` backtick");
    }

    #[test]
    fn test_unmatched_backticks() {
        let (spans, _) = spans_of("hello `code`` world");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_backslash_does_not_escape_closer() {
        let text = r"`foo\`bar`";
        let (spans, _) = spans_of(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(content(text, &spans[0]), r"foo\");
    }

    #[test]
    fn test_escaped_opener() {
        let text = r"\``foo`";
        let (spans, _) = spans_of(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 2);
        assert_eq!(content(text, &spans[0]), "foo");
    }

    #[test]
    fn test_emphasis_inside_code() {
        let (_, marks) = spans_of("`*not emphasis*`");
        for mark in marks.iter().filter(|m| m.ch == b'*') {
            assert!(mark.is_consumed());
        }
    }

    #[test]
    fn test_first_start_wins() {
        let text = "`<a href=\"`\">`";
        let (spans, _) = spans_of(text);
        assert!(matches!(spans[0].kind, SpanKind::Code { .. }));
        assert_eq!(spans[0].end, 11);

        let text = "<a href=\"`\">`";
        let (spans, _) = spans_of(text);
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].kind, SpanKind::Html));
    }

    #[test]
    fn test_autolink_and_html_disabled() {
        let text = "<https://x.org> <b>";
        let mut buffer = MarkBuffer::new();
        collect_marks(text, &mut buffer);
        let mut spans = Vec::new();
        resolve_spans(text.as_bytes(), buffer.marks_mut(), false, &mut spans);
        assert_eq!(spans.len(), 1);
        assert!(matches!(spans[0].kind, SpanKind::Autolink { is_email: false, .. }));
    }
}
