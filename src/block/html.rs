//! HTML block start and end conditions.

use memchr::memmem;

use crate::inline::html::{parse_closing_tag, parse_open_tag, tag_name};

/// Tag names that start a type 6 block.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

/// Tag names that start a type 1 block.
const RAW_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

/// Which HTML block, if any, `rest` (a line from its first non-space byte)
/// opens. Type 7 is not considered when `interrupts_paragraph` is set.
pub fn start_condition(rest: &[u8], interrupts_paragraph: bool) -> Option<u8> {
    if rest.first() != Some(&b'<') {
        return None;
    }
    if rest.starts_with(b"<!--") {
        return Some(2);
    }
    if rest.starts_with(b"<?") {
        return Some(3);
    }
    if rest.starts_with(b"<![CDATA[") {
        return Some(5);
    }
    if rest.len() > 2 && rest[1] == b'!' && rest[2].is_ascii_alphabetic() {
        return Some(4);
    }

    let (name, name_end) = tag_name(rest)?;
    let closing = rest.get(1) == Some(&b'/');
    let after = rest.get(name_end).copied();

    if !closing
        && RAW_TAGS.contains(&name.as_str())
        && matches!(after, None | Some(b' ' | b'\t' | b'>'))
    {
        return Some(1);
    }

    if BLOCK_TAGS.contains(&name.as_str()) {
        let ends_tag = match after {
            None | Some(b' ' | b'\t' | b'>') => true,
            Some(b'/') => rest.get(name_end + 1) == Some(&b'>'),
            _ => false,
        };
        if ends_tag {
            return Some(6);
        }
    }

    if interrupts_paragraph {
        return None;
    }
    let end = if closing {
        parse_closing_tag(rest, 0)?
    } else {
        parse_open_tag(rest, 0)?
    };
    rest[end..]
        .iter()
        .all(|&b| b == b' ' || b == b'\t')
        .then_some(7)
}

/// Whether `line` satisfies the end condition of a type 1-5 block.
pub fn end_condition(kind: u8, line: &[u8]) -> bool {
    match kind {
        1 => {
            let lower: Vec<u8> = line.to_ascii_lowercase();
            RAW_TAGS.iter().any(|tag| {
                let needle = format!("</{tag}>");
                memmem::find(&lower, needle.as_bytes()).is_some()
            })
        }
        2 => memmem::find(line, b"-->").is_some(),
        3 => memmem::find(line, b"?>").is_some(),
        4 => memchr::memchr(b'>', line).is_some(),
        5 => memmem::find(line, b"]]>").is_some(),
        _ => false,
    }
}
