//! Mark collection and buffer for inline parsing.
//!
//! Marks represent potential syntax positions (backtick runs, emphasis
//! runs, escapes, line endings, brackets, `<`) collected in a single pass
//! before resolution.

use crate::escape::is_escapable;
use crate::limits;

/// Flags for mark state.
pub mod flags {
    pub const POTENTIAL_OPENER: u8 = 0b0000_0001;
    pub const POTENTIAL_CLOSER: u8 = 0b0000_0010;
    /// Inside a resolved span (code, HTML, autolink, wikilink, link
    /// destination): the mark no longer takes part in resolution.
    pub const CONSUMED: u8 = 0b0000_0100;
    /// Line ending is a hard break.
    pub const HARD: u8 = 0b0000_1000;
    /// Backtick run whose first backtick is backslash-escaped.
    pub const ESCAPED: u8 = 0b0001_0000;
    /// `![` image opener.
    pub const IMAGE: u8 = 0b0010_0000;
}

/// A potential syntax mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    /// Start position in text.
    pub pos: u32,
    /// End position (exclusive).
    pub end: u32,
    /// `` ` ``, `*`, `_`, `\\`, `\n`, `[`, `]` or `<`.
    pub ch: u8,
    pub flags: u8,
}

impl Mark {
    #[inline]
    pub fn new(pos: u32, end: u32, ch: u8, flags: u8) -> Self {
        Self { pos, end, ch, flags }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.pos
    }

    #[inline]
    pub fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn is_consumed(&self) -> bool {
        self.has(flags::CONSUMED)
    }

    #[inline]
    pub fn consume(&mut self) {
        self.flags |= flags::CONSUMED;
    }

    /// Position of the bracket byte itself (skips the `!` of `![`).
    #[inline]
    pub fn bracket_pos(&self) -> u32 {
        self.end - 1
    }
}

/// Buffer for collecting marks during inline scanning.
#[derive(Debug)]
pub struct MarkBuffer {
    marks: Vec<Mark>,
    /// Offset where collection stopped because the limit was reached.
    overflow_at: Option<u32>,
}

impl MarkBuffer {
    pub fn new() -> Self {
        Self {
            marks: Vec::with_capacity(64),
            overflow_at: None,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.marks.clear();
        self.overflow_at = None;
    }

    /// Add a mark. Returns `false` once the limit is reached.
    #[inline]
    pub fn push(&mut self, mark: Mark) -> bool {
        if self.marks.len() < limits::MAX_INLINE_MARKS {
            self.marks.push(mark);
            true
        } else {
            self.overflow_at.get_or_insert(mark.pos);
            false
        }
    }

    #[inline]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    #[inline]
    pub fn marks_mut(&mut self) -> &mut [Mark] {
        &mut self.marks
    }

    #[inline]
    pub fn overflow_at(&self) -> Option<u32> {
        self.overflow_at
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl Default for MarkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lookup table for bytes that may start a mark.
pub static SPECIAL_CHARS: [bool; 256] = {
    let mut table = [false; 256];
    table[b'`' as usize] = true;
    table[b'*' as usize] = true;
    table[b'_' as usize] = true;
    table[b'\\' as usize] = true;
    table[b'\n' as usize] = true;
    table[b'[' as usize] = true;
    table[b']' as usize] = true;
    table[b'!' as usize] = true;
    table[b'<' as usize] = true;
    table
};

/// Unicode whitespace for flanking purposes. Text edges count as whitespace.
#[inline]
fn is_flank_whitespace(c: Option<char>) -> bool {
    c.is_none_or(char::is_whitespace)
}

/// ASCII punctuation, or any non-ASCII character that is neither
/// alphanumeric, whitespace nor a control character.
#[inline]
pub fn is_flank_punctuation(c: Option<char>) -> bool {
    match c {
        Some(c) if c.is_ascii() => is_escapable(c as u8),
        Some(c) => !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control(),
        None => false,
    }
}

/// Compute opener/closer flags for a `*` or `_` run at `start..end`.
pub fn flanking_flags(text: &str, start: usize, end: usize, ch: u8) -> u8 {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    let left = !is_flank_whitespace(after)
        && (!is_flank_punctuation(after)
            || is_flank_whitespace(before)
            || is_flank_punctuation(before));
    let right = !is_flank_whitespace(before)
        && (!is_flank_punctuation(before)
            || is_flank_whitespace(after)
            || is_flank_punctuation(after));

    let (can_open, can_close) = if ch == b'*' {
        (left, right)
    } else {
        (
            left && (!right || is_flank_punctuation(before)),
            right && (!left || is_flank_punctuation(after)),
        )
    };

    let mut f = 0;
    if can_open {
        f |= flags::POTENTIAL_OPENER;
    }
    if can_close {
        f |= flags::POTENTIAL_CLOSER;
    }
    f
}

#[inline]
fn run_len(bytes: &[u8], start: usize, b: u8) -> usize {
    bytes[start..].iter().take_while(|&&c| c == b).count()
}

/// Collect all marks in `text` into `buffer`.
pub fn collect_marks(text: &str, buffer: &mut MarkBuffer) {
    buffer.clear();
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        let b = bytes[pos];
        if !SPECIAL_CHARS[b as usize] {
            pos += 1;
            continue;
        }

        let pushed = match b {
            b'`' => {
                let run = run_len(bytes, pos, b'`');
                let ok = buffer.push(Mark::new(pos as u32, (pos + run) as u32, b'`', 0));
                pos += run;
                ok
            }
            b'*' | b'_' => {
                let run = run_len(bytes, pos, b);
                let f = flanking_flags(text, pos, pos + run, b);
                let ok = buffer.push(Mark::new(pos as u32, (pos + run) as u32, b, f));
                pos += run;
                ok
            }
            b'\\' => match bytes.get(pos + 1) {
                Some(b'\n') => {
                    let ok = buffer.push(Mark::new(pos as u32, (pos + 2) as u32, b'\n', flags::HARD));
                    pos += 2;
                    ok
                }
                Some(b'`') => {
                    // The escaped backtick still counts towards a closing run.
                    let run = run_len(bytes, pos + 1, b'`');
                    let ok = buffer.push(Mark::new(pos as u32, (pos + 2) as u32, b'\\', 0))
                        && buffer.push(Mark::new(
                            (pos + 1) as u32,
                            (pos + 1 + run) as u32,
                            b'`',
                            flags::ESCAPED,
                        ));
                    pos += 1 + run;
                    ok
                }
                Some(&next) if is_escapable(next) => {
                    let ok = buffer.push(Mark::new(pos as u32, (pos + 2) as u32, b'\\', 0));
                    pos += 2;
                    ok
                }
                _ => {
                    pos += 1;
                    true
                }
            },
            b'\n' => {
                let spaces = bytes[..pos].iter().rev().take_while(|&&c| c == b' ').count();
                let f = if spaces >= 2 { flags::HARD } else { 0 };
                let ok = buffer.push(Mark::new((pos - spaces) as u32, (pos + 1) as u32, b'\n', f));
                pos += 1;
                ok
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'[') {
                    let ok = buffer.push(Mark::new(pos as u32, (pos + 2) as u32, b'[', flags::IMAGE));
                    pos += 2;
                    ok
                } else {
                    pos += 1;
                    true
                }
            }
            _ => {
                let ok = buffer.push(Mark::new(pos as u32, (pos + 1) as u32, b, 0));
                pos += 1;
                ok
            }
        };

        if !pushed {
            break;
        }
    }
}
