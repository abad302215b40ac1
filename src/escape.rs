//! Backslash escapes, entity references and Markdown re-escaping.
//!
//! Fast path: scan with memchr for the first byte of interest and return the
//! input borrowed when there is nothing to do.

use std::borrow::Cow;

use memchr::{memchr, memchr2};

/// ASCII punctuation: the bytes CommonMark lets a backslash escape.
pub static ESCAPABLE: [bool; 256] = {
    let mut table = [false; 256];
    let punct = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";
    let mut i = 0;
    while i < punct.len() {
        table[punct[i] as usize] = true;
        i += 1;
    }
    table
};

/// Bytes the Markdown writer escapes inside text so they re-parse as text.
static MARKDOWN_SPECIAL: [bool; 256] = {
    let mut table = [false; 256];
    let special = b"\\`*_[]<>!#+-=|&~.()";
    let mut i = 0;
    while i < special.len() {
        table[special[i] as usize] = true;
        i += 1;
    }
    table
};

/// Named references whose value is two code points, sorted by name.
/// `html_escape` keeps only the first code point of these.
static TWO_CODE_POINT_ENTITIES: [(&str, &str); 93] = [
    ("NotEqualTilde", "\u{2242}\u{0338}"),
    ("NotGreaterFullEqual", "\u{2267}\u{0338}"),
    ("NotGreaterGreater", "\u{226B}\u{0338}"),
    ("NotGreaterSlantEqual", "\u{2A7E}\u{0338}"),
    ("NotHumpDownHump", "\u{224E}\u{0338}"),
    ("NotHumpEqual", "\u{224F}\u{0338}"),
    ("NotLeftTriangleBar", "\u{29CF}\u{0338}"),
    ("NotLessLess", "\u{226A}\u{0338}"),
    ("NotLessSlantEqual", "\u{2A7D}\u{0338}"),
    ("NotNestedGreaterGreater", "\u{2AA2}\u{0338}"),
    ("NotNestedLessLess", "\u{2AA1}\u{0338}"),
    ("NotPrecedesEqual", "\u{2AAF}\u{0338}"),
    ("NotRightTriangleBar", "\u{29D0}\u{0338}"),
    ("NotSquareSubset", "\u{228F}\u{0338}"),
    ("NotSquareSuperset", "\u{2290}\u{0338}"),
    ("NotSubset", "\u{2282}\u{20D2}"),
    ("NotSucceedsEqual", "\u{2AB0}\u{0338}"),
    ("NotSucceedsTilde", "\u{227F}\u{0338}"),
    ("NotSuperset", "\u{2283}\u{20D2}"),
    ("ThickSpace", "\u{205F}\u{200A}"),
    ("acE", "\u{223E}\u{0333}"),
    ("bne", "\u{003D}\u{20E5}"),
    ("bnequiv", "\u{2261}\u{20E5}"),
    ("caps", "\u{2229}\u{FE00}"),
    ("cups", "\u{222A}\u{FE00}"),
    ("fjlig", "\u{0066}\u{006A}"),
    ("gesl", "\u{22DB}\u{FE00}"),
    ("gvertneqq", "\u{2269}\u{FE00}"),
    ("gvnE", "\u{2269}\u{FE00}"),
    ("lates", "\u{2AAD}\u{FE00}"),
    ("lesg", "\u{22DA}\u{FE00}"),
    ("lvertneqq", "\u{2268}\u{FE00}"),
    ("lvnE", "\u{2268}\u{FE00}"),
    ("nGg", "\u{22D9}\u{0338}"),
    ("nGt", "\u{226B}\u{20D2}"),
    ("nGtv", "\u{226B}\u{0338}"),
    ("nLl", "\u{22D8}\u{0338}"),
    ("nLt", "\u{226A}\u{20D2}"),
    ("nLtv", "\u{226A}\u{0338}"),
    ("nang", "\u{2220}\u{20D2}"),
    ("napE", "\u{2A70}\u{0338}"),
    ("napid", "\u{224B}\u{0338}"),
    ("nbump", "\u{224E}\u{0338}"),
    ("nbumpe", "\u{224F}\u{0338}"),
    ("ncongdot", "\u{2A6D}\u{0338}"),
    ("nedot", "\u{2250}\u{0338}"),
    ("nesim", "\u{2242}\u{0338}"),
    ("ngE", "\u{2267}\u{0338}"),
    ("ngeqq", "\u{2267}\u{0338}"),
    ("ngeqslant", "\u{2A7E}\u{0338}"),
    ("nges", "\u{2A7E}\u{0338}"),
    ("nlE", "\u{2266}\u{0338}"),
    ("nleqq", "\u{2266}\u{0338}"),
    ("nleqslant", "\u{2A7D}\u{0338}"),
    ("nles", "\u{2A7D}\u{0338}"),
    ("notinE", "\u{22F9}\u{0338}"),
    ("notindot", "\u{22F5}\u{0338}"),
    ("nparsl", "\u{2AFD}\u{20E5}"),
    ("npart", "\u{2202}\u{0338}"),
    ("npre", "\u{2AAF}\u{0338}"),
    ("npreceq", "\u{2AAF}\u{0338}"),
    ("nrarrc", "\u{2933}\u{0338}"),
    ("nrarrw", "\u{219D}\u{0338}"),
    ("nsce", "\u{2AB0}\u{0338}"),
    ("nsubE", "\u{2AC5}\u{0338}"),
    ("nsubset", "\u{2282}\u{20D2}"),
    ("nsubseteqq", "\u{2AC5}\u{0338}"),
    ("nsucceq", "\u{2AB0}\u{0338}"),
    ("nsupE", "\u{2AC6}\u{0338}"),
    ("nsupset", "\u{2283}\u{20D2}"),
    ("nsupseteqq", "\u{2AC6}\u{0338}"),
    ("nvap", "\u{224D}\u{20D2}"),
    ("nvge", "\u{2265}\u{20D2}"),
    ("nvgt", "\u{003E}\u{20D2}"),
    ("nvle", "\u{2264}\u{20D2}"),
    ("nvlt", "\u{003C}\u{20D2}"),
    ("nvltrie", "\u{22B4}\u{20D2}"),
    ("nvrtrie", "\u{22B5}\u{20D2}"),
    ("nvsim", "\u{223C}\u{20D2}"),
    ("race", "\u{223D}\u{0331}"),
    ("smtes", "\u{2AAC}\u{FE00}"),
    ("sqcaps", "\u{2293}\u{FE00}"),
    ("sqcups", "\u{2294}\u{FE00}"),
    ("varsubsetneq", "\u{228A}\u{FE00}"),
    ("varsubsetneqq", "\u{2ACB}\u{FE00}"),
    ("varsupsetneq", "\u{228B}\u{FE00}"),
    ("varsupsetneqq", "\u{2ACC}\u{FE00}"),
    ("vnsub", "\u{2282}\u{20D2}"),
    ("vnsup", "\u{2283}\u{20D2}"),
    ("vsubnE", "\u{2ACB}\u{FE00}"),
    ("vsubne", "\u{228A}\u{FE00}"),
    ("vsupnE", "\u{2ACC}\u{FE00}"),
    ("vsupne", "\u{228B}\u{FE00}"),
];

#[inline]
pub fn is_escapable(b: u8) -> bool {
    ESCAPABLE[b as usize]
}

/// Remove backslashes in front of ASCII punctuation.
///
/// # Example
/// ```
/// use wikimark::escape::unescape;
///
/// assert_eq!(unescape(r"a\|b\q"), r"a|b\q");
/// ```
pub fn unescape(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(first) = memchr(b'\\', bytes) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..first]);
    let mut pos = first;
    while pos < bytes.len() {
        let Some(rel) = memchr(b'\\', &bytes[pos..]) else {
            out.push_str(&input[pos..]);
            break;
        };
        let slash = pos + rel;
        out.push_str(&input[pos..slash]);
        match bytes.get(slash + 1) {
            Some(&b) if is_escapable(b) => {
                out.push(b as char);
                pos = slash + 2;
            }
            _ => {
                out.push('\\');
                pos = slash + 1;
            }
        }
    }
    Cow::Owned(out)
}

/// Resolve backslash escapes and entity references in one pass, as done for
/// link destinations, titles and info strings.
pub fn unescape_and_decode(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(first) = memchr2(b'\\', b'&', bytes) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..first]);
    let mut pos = first;
    while pos < bytes.len() {
        let Some(rel) = memchr2(b'\\', b'&', &bytes[pos..]) else {
            out.push_str(&input[pos..]);
            break;
        };
        let at = pos + rel;
        out.push_str(&input[pos..at]);
        if bytes[at] == b'\\' {
            match bytes.get(at + 1) {
                Some(&b) if is_escapable(b) => {
                    out.push(b as char);
                    pos = at + 2;
                }
                _ => {
                    out.push('\\');
                    pos = at + 1;
                }
            }
        } else if let Some((decoded, len)) = scan_entity(&bytes[at..]) {
            out.push_str(&decoded);
            pos = at + len;
        } else {
            out.push('&');
            pos = at + 1;
        }
    }
    Cow::Owned(out)
}

/// Decode entity references only.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(input);
    };
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut pos = first;
    while let Some(rel) = memchr(b'&', &bytes[pos..]) {
        let at = pos + rel;
        if let Some((decoded, len)) = scan_entity(&bytes[at..]) {
            let buf = out.get_or_insert_with(|| String::with_capacity(input.len()));
            buf.push_str(&input[copied..at]);
            buf.push_str(&decoded);
            copied = at + len;
            pos = copied;
        } else {
            pos = at + 1;
        }
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&input[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(input),
    }
}

/// Parse an entity reference at the start of `bytes` (which begins with `&`).
/// Returns the decoded text and the number of bytes consumed.
pub fn scan_entity(bytes: &[u8]) -> Option<(Cow<'static, str>, usize)> {
    if bytes.first() != Some(&b'&') {
        return None;
    }
    if bytes.get(1) == Some(&b'#') {
        let (hex, digits_start) = match bytes.get(2) {
            Some(b'x' | b'X') => (true, 3),
            _ => (false, 2),
        };
        let max_digits = if hex { 6 } else { 7 };
        let digits = bytes[digits_start..]
            .iter()
            .take(max_digits + 1)
            .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            .count();
        if digits == 0 || digits > max_digits || bytes.get(digits_start + digits) != Some(&b';') {
            return None;
        }
        let text = std::str::from_utf8(&bytes[digits_start..digits_start + digits]).ok()?;
        let code = u32::from_str_radix(text, if hex { 16 } else { 10 }).ok()?;
        let ch = match code {
            0 => '\u{FFFD}',
            _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
        };
        return Some((Cow::Owned(ch.to_string()), digits_start + digits + 1));
    }

    let name_len = bytes[1..]
        .iter()
        .take(33)
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || name_len > 32 || !bytes[1].is_ascii_alphabetic() {
        return None;
    }
    if bytes.get(1 + name_len) != Some(&b';') {
        return None;
    }
    let candidate = std::str::from_utf8(&bytes[..name_len + 2]).ok()?;
    let name = &candidate[1..=name_len];
    if let Ok(i) = TWO_CODE_POINT_ENTITIES.binary_search_by(|(n, _)| n.cmp(&name)) {
        return Some((Cow::Borrowed(TWO_CODE_POINT_ENTITIES[i].1), name_len + 2));
    }
    match html_escape::decode_html_entities(candidate) {
        Cow::Owned(decoded) if decoded != candidate => Some((Cow::Owned(decoded), name_len + 2)),
        _ => None,
    }
}

/// Append `text` to `out`, backslash-escaping bytes that would otherwise be
/// read back as Markdown syntax.
pub fn escape_markdown_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut copied = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if MARKDOWN_SPECIAL[b as usize] {
            out.push_str(&text[copied..i]);
            out.push('\\');
            out.push(b as char);
            copied = i + 1;
        }
    }
    out.push_str(&text[copied..]);
}
