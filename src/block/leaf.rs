//! Recognisers for single-line block syntax.
//!
//! Each function takes the rest of a line starting at its first non-space
//! byte (line terminator excluded) and reports what it found, without
//! touching parser state.

use crate::limits;

/// `#`-prefixed heading opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtxHeading {
    pub level: u8,
    /// Content bounds relative to the scanned slice.
    pub content_start: usize,
    pub content_end: usize,
}

#[inline]
fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Parse an ATX heading: 1-6 `#` followed by whitespace or end of line.
/// An optional closing sequence of `#` preceded by whitespace is dropped.
pub fn atx_heading(rest: &[u8]) -> Option<AtxHeading> {
    let level = rest.iter().take_while(|&&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    match rest.get(level) {
        None => {
            return Some(AtxHeading {
                level: level as u8,
                content_start: level,
                content_end: level,
            });
        }
        Some(&b) if is_space_or_tab(b) => {}
        Some(_) => return None,
    }

    let mut start = level;
    while start < rest.len() && is_space_or_tab(rest[start]) {
        start += 1;
    }
    let mut end = rest.len();
    while end > start && is_space_or_tab(rest[end - 1]) {
        end -= 1;
    }

    // Closing sequence: trailing #s preceded by a space (or nothing at all).
    let mut hashes = end;
    while hashes > start && rest[hashes - 1] == b'#' {
        hashes -= 1;
    }
    if hashes < end && (hashes == start || is_space_or_tab(rest[hashes - 1])) {
        end = hashes;
        while end > start && is_space_or_tab(rest[end - 1]) {
            end -= 1;
        }
    }

    Some(AtxHeading {
        level: level as u8,
        content_start: start,
        content_end: end,
    })
}

/// Setext underline: a run of `=` (level 1) or `-` (level 2) with optional
/// trailing whitespace.
pub fn setext_underline(rest: &[u8]) -> Option<u8> {
    let ch = *rest.first()?;
    let level = match ch {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let run = rest.iter().take_while(|&&b| b == ch).count();
    rest[run..].iter().all(|&b| is_space_or_tab(b)).then_some(level)
}

/// Three or more `*`, `-` or `_`, optionally separated by whitespace.
pub fn thematic_break(rest: &[u8]) -> bool {
    let Some(&marker) = rest.first() else {
        return false;
    };
    if !matches!(marker, b'*' | b'-' | b'_') {
        return false;
    }
    let mut count = 0;
    for &b in rest {
        if b == marker {
            count += 1;
        } else if !is_space_or_tab(b) {
            return false;
        }
    }
    count >= 3
}

/// Opening code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpen {
    pub ch: u8,
    pub len: usize,
    /// Trimmed info string bounds relative to the scanned slice.
    pub info_start: usize,
    pub info_end: usize,
}

/// At least three backticks or tildes. A backtick fence's info string may
/// not contain a backtick.
pub fn fence_open(rest: &[u8]) -> Option<FenceOpen> {
    let ch = *rest.first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = rest.iter().take_while(|&&b| b == ch).count();
    if len < 3 {
        return None;
    }
    if ch == b'`' && memchr::memchr(b'`', &rest[len..]).is_some() {
        return None;
    }
    let mut info_start = len;
    while info_start < rest.len() && is_space_or_tab(rest[info_start]) {
        info_start += 1;
    }
    let mut info_end = rest.len();
    while info_end > info_start && is_space_or_tab(rest[info_end - 1]) {
        info_end -= 1;
    }
    Some(FenceOpen {
        ch,
        len,
        info_start,
        info_end,
    })
}

/// Closing fence for an open block fenced with `len` copies of `ch`.
pub fn fence_close(rest: &[u8], ch: u8, len: usize) -> bool {
    let run = rest.iter().take_while(|&&b| b == ch).count();
    run >= len && run >= 3 && rest[run..].iter().all(|&b| is_space_or_tab(b))
}

/// List marker found at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub ordered: bool,
    /// Bullet character or ordered delimiter.
    pub marker: u8,
    pub start: u64,
    /// Bytes covered by the marker itself.
    pub width: usize,
}

/// Bullet (`-`, `+`, `*`) or ordered (`1.`, `1)`) marker followed by
/// whitespace or end of line. Padding is computed by the caller, which knows
/// the column.
pub fn list_marker(rest: &[u8]) -> Option<ListMarker> {
    let first = *rest.first()?;
    let marker = if matches!(first, b'-' | b'+' | b'*') {
        ListMarker {
            ordered: false,
            marker: first,
            start: 1,
            width: 1,
        }
    } else if first.is_ascii_digit() {
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > limits::MAX_LIST_MARKER_DIGITS {
            return None;
        }
        let delim = *rest.get(digits)?;
        if delim != b'.' && delim != b')' {
            return None;
        }
        let start = rest[..digits]
            .iter()
            .fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));
        ListMarker {
            ordered: true,
            marker: delim,
            start,
            width: digits + 1,
        }
    } else {
        return None;
    };
    match rest.get(marker.width) {
        None => Some(marker),
        Some(&b) if is_space_or_tab(b) => Some(marker),
        Some(_) => None,
    }
}

/// Bytes that can begin some block construct other than a paragraph line.
#[inline]
pub fn maybe_special(b: u8) -> bool {
    matches!(
        b,
        b'#' | b'`' | b'~' | b'*' | b'+' | b'_' | b'=' | b'<' | b'>' | b'-'
    ) || b.is_ascii_digit()
}
