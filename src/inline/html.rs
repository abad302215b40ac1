//! Raw HTML recognition shared by inline HTML and HTML block type 7.

use memchr::memmem;

/// Parse raw inline HTML starting at `start` (which must be `<`).
/// Returns the end offset (exclusive).
pub fn parse_inline_html(text: &[u8], start: usize) -> Option<usize> {
    if text.get(start) != Some(&b'<') {
        return None;
    }
    match text.get(start + 1)? {
        b'!' => {
            let rest = &text[start..];
            if rest.starts_with(b"<!--") {
                parse_comment(text, start)
            } else if rest.starts_with(b"<![CDATA[") {
                find(text, start + 9, b"]]>").map(|end| end + 3)
            } else {
                parse_declaration(text, start)
            }
        }
        b'?' => find(text, start + 2, b"?>").map(|end| end + 2),
        b'/' => parse_closing_tag(text, start),
        _ => parse_open_tag(text, start),
    }
}

fn parse_comment(text: &[u8], start: usize) -> Option<usize> {
    let i = start + 4;
    match text.get(i) {
        Some(b'>') => return Some(i + 1),
        Some(b'-') if text.get(i + 1) == Some(&b'>') => return Some(i + 2),
        _ => {}
    }
    find(text, i, b"-->").map(|end| end + 3)
}

fn parse_declaration(text: &[u8], start: usize) -> Option<usize> {
    if !text.get(start + 2)?.is_ascii_alphabetic() {
        return None;
    }
    memchr::memchr(b'>', &text[start + 2..]).map(|rel| start + 2 + rel + 1)
}

/// `</name>` with optional whitespace before `>`.
pub fn parse_closing_tag(text: &[u8], start: usize) -> Option<usize> {
    if text.get(start) != Some(&b'<') || text.get(start + 1) != Some(&b'/') {
        return None;
    }
    let mut i = scan_tag_name(text, start + 2)?;
    i = skip_whitespace(text, i);
    (text.get(i) == Some(&b'>')).then_some(i + 1)
}

/// `<name attr="value" ... />`.
pub fn parse_open_tag(text: &[u8], start: usize) -> Option<usize> {
    if text.get(start) != Some(&b'<') {
        return None;
    }
    let mut i = scan_tag_name(text, start + 1)?;
    loop {
        let ws_end = skip_whitespace(text, i);
        match text.get(ws_end)? {
            b'>' => return Some(ws_end + 1),
            b'/' => return (text.get(ws_end + 1) == Some(&b'>')).then_some(ws_end + 2),
            &b if ws_end > i && is_attr_name_start(b) => {
                i = scan_attribute(text, ws_end)?;
            }
            _ => return None,
        }
    }
}

/// Tag name of an open or closing tag at the start of `text`, lowercased.
/// Used by HTML block start conditions.
pub fn tag_name(text: &[u8]) -> Option<(String, usize)> {
    let start = if text.get(1) == Some(&b'/') { 2 } else { 1 };
    if text.first() != Some(&b'<') {
        return None;
    }
    let end = scan_tag_name(text, start)?;
    let name = text[start..end].iter().map(|b| b.to_ascii_lowercase() as char).collect();
    Some((name, end))
}

fn scan_tag_name(text: &[u8], start: usize) -> Option<usize> {
    if !text.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let mut i = start + 1;
    while i < text.len() && (text[i].is_ascii_alphanumeric() || text[i] == b'-') {
        i += 1;
    }
    Some(i)
}

/// Attribute name with an optional value specification.
fn scan_attribute(text: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < text.len() && is_attr_name_char(text[i]) {
        i += 1;
    }
    let name_end = i;
    let eq = skip_whitespace(text, i);
    if text.get(eq) != Some(&b'=') {
        return Some(name_end);
    }
    i = skip_whitespace(text, eq + 1);
    match *text.get(i)? {
        quote @ (b'"' | b'\'') => {
            let rel = memchr::memchr(quote, &text[i + 1..])?;
            Some(i + 1 + rel + 1)
        }
        _ => {
            let value_start = i;
            while i < text.len() && is_unquoted_value_char(text[i]) {
                i += 1;
            }
            (i > value_start).then_some(i)
        }
    }
}

fn skip_whitespace(text: &[u8], mut i: usize) -> usize {
    while i < text.len() && is_html_whitespace(text[i]) {
        i += 1;
    }
    i
}

fn find(text: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    let hay = text.get(from..)?;
    memmem::find(hay, needle).map(|rel| from + rel)
}

#[inline]
fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[inline]
fn is_attr_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

#[inline]
fn is_attr_name_char(b: u8) -> bool {
    is_attr_name_start(b) || b.is_ascii_digit() || b == b'.' || b == b'-'
}

#[inline]
fn is_unquoted_value_char(b: u8) -> bool {
    b > b' ' && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
}
