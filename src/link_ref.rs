//! Link reference definitions (CommonMark).

use rustc_hash::FxHashMap;

use crate::escape::unescape_and_decode;
use crate::inline::links::{scan_link_destination, scan_link_label, scan_link_title, skip_spnl};

/// A link reference definition (destination + title), escapes and entities
/// already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefDef {
    pub dest: String,
    pub title: String,
}

/// Store of link reference definitions, keyed by normalized label.
#[derive(Debug, Default, Clone)]
pub struct LinkRefStore {
    defs: Vec<LinkRefDef>,
    by_label: FxHashMap<String, usize>,
}

impl LinkRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition if the label is new. First definition wins.
    pub fn insert(&mut self, label: String, def: LinkRefDef) {
        if self.by_label.contains_key(&label) {
            return;
        }
        let idx = self.defs.len();
        self.defs.push(def);
        self.by_label.insert(label, idx);
    }

    /// Index of the definition for a raw (unnormalized) label.
    pub fn lookup(&self, raw_label: &str) -> Option<usize> {
        if self.defs.is_empty() {
            return None;
        }
        let label = normalize_label(raw_label);
        if label.is_empty() {
            return None;
        }
        self.by_label.get(&label).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&LinkRefDef> {
        self.defs.get(idx)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Normalize a link label: collapse internal whitespace to single spaces,
/// trim, and case-fold.
///
/// # Example
/// ```
/// use wikimark::link_ref::normalize_label;
///
/// assert_eq!(normalize_label("  Foo\n  BAR "), normalize_label("foo bar"));
/// assert_eq!(normalize_label("ẞ"), normalize_label("SS"));
/// ```
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_space = false;
    for ch in label.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r') {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        // Lower then upper, so that `ẞ`, `ß` and `SS` fold together.
        for lower in ch.to_lowercase() {
            out.extend(lower.to_uppercase());
        }
    }
    out
}

/// A definition parsed from the start of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDef {
    /// Normalized label.
    pub label: String,
    pub def: LinkRefDef,
    /// Bytes consumed, through the end of the definition's last line.
    pub consumed: usize,
}

/// Parse one link reference definition at the start of `text`.
pub fn parse_link_ref_def(text: &str) -> Option<ParsedDef> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let label_end = scan_link_label(bytes, 0)?;
    let label = normalize_label(&text[1..label_end - 1]);
    if label.is_empty() || bytes.get(label_end) != Some(&b':') {
        return None;
    }

    let dest_start = skip_spnl(bytes, label_end + 1);
    let dest = scan_link_destination(bytes, dest_start)?;
    if dest.range.is_empty() && !dest.angled {
        return None;
    }
    let before_title = dest.end;

    // A title must be separated from the destination by whitespace and be
    // followed by nothing but whitespace on its line.
    let title_start = skip_spnl(bytes, before_title);
    if title_start > before_title {
        if let Some(title) = scan_link_title(bytes, title_start) {
            if let Some(consumed) = line_end_after(bytes, title.end) {
                return Some(ParsedDef {
                    label,
                    def: LinkRefDef {
                        dest: unescape_and_decode(dest.range.slice_str(text)?).into_owned(),
                        title: unescape_and_decode(title.range.slice_str(text)?).into_owned(),
                    },
                    consumed,
                });
            }
        }
    }

    let consumed = line_end_after(bytes, before_title)?;
    Some(ParsedDef {
        label,
        def: LinkRefDef {
            dest: unescape_and_decode(dest.range.slice_str(text)?).into_owned(),
            title: String::new(),
        },
        consumed,
    })
}

/// Offset just past the line ending that follows `pos`, allowing only
/// spaces and tabs in between.
fn line_end_after(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    match bytes.get(pos) {
        None => Some(pos),
        Some(b'\n') => Some(pos + 1),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_definition_wins() {
        let mut store = LinkRefStore::new();
        let def = |d: &str| LinkRefDef {
            dest: d.to_string(),
            title: String::new(),
        };
        store.insert(normalize_label("Foo"), def("/first"));
        store.insert(normalize_label("FOO"), def("/second"));
        let idx = store.lookup("foo").unwrap();
        assert_eq!(store.get(idx).unwrap().dest, "/first");
        assert_eq!(store.len(), 1);
        assert!(store.lookup("bar").is_none());
    }

    #[test]
    fn test_parse_simple_definition() {
        let parsed = parse_link_ref_def("[Foo]: /url \"title\"\nrest").unwrap();
        assert_eq!(parsed.label, normalize_label("foo"));
        assert_eq!(parsed.def.dest, "/url");
        assert_eq!(parsed.def.title, "title");
        assert_eq!(parsed.consumed, 20);
    }

    #[test]
    fn test_parse_multiline_definition() {
        let parsed = parse_link_ref_def("[foo]:\n/url\n'the title'").unwrap();
        assert_eq!(parsed.def.dest, "/url");
        assert_eq!(parsed.def.title, "the title");
    }

    #[test]
    fn test_title_on_next_line_is_optional() {
        // The second line is not a valid title, so it stays in the paragraph.
        let text = "[foo]: /url\n\"title\" ok";
        let parsed = parse_link_ref_def(text).unwrap();
        assert_eq!(parsed.def.title, "");
        assert_eq!(&text[parsed.consumed..], "\"title\" ok");
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert!(parse_link_ref_def("[foo]: /url \"title\" ok").is_none());
        assert!(parse_link_ref_def("[foo]:").is_none());
        assert!(parse_link_ref_def("[ ]: /url").is_none());
        assert!(parse_link_ref_def("[foo] /url").is_none());
    }

    #[test]
    fn test_angled_destination_and_escapes() {
        let parsed = parse_link_ref_def("[a]: <my url> 'it\\'s'").unwrap();
        assert_eq!(parsed.def.dest, "my url");
        assert_eq!(parsed.def.title, "it's");
        let parsed = parse_link_ref_def("[b]: <>").unwrap();
        assert_eq!(parsed.def.dest, "");
    }
}
