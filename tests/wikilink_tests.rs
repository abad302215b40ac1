use wikimark::{parse, Event, Options, Parser, Tag, TagEnd};

fn wiki<'a>(target: &'a str, label: &'a str) -> Event<'a> {
    Event::Start(Tag::WikiLink {
        target: target.into(),
        label: label.into(),
    })
}

fn inline(input: &str) -> Vec<Event<'_>> {
    let mut events = parse(input);
    assert_eq!(events.first(), Some(&Event::Start(Tag::Paragraph)));
    assert_eq!(events.last(), Some(&Event::End(TagEnd::Paragraph)));
    events.pop();
    events.remove(0);
    events
}

#[test]
fn target_only() {
    assert_eq!(
        inline("[[target]]"),
        vec![wiki("target", "target"), Event::Text("target".into()), Event::End(TagEnd::WikiLink)]
    );
}

#[test]
fn target_and_label() {
    assert_eq!(
        inline("[[target|label]]"),
        vec![wiki("target", "label"), Event::Text("label".into()), Event::End(TagEnd::WikiLink)]
    );
}

#[test]
fn empty_label_falls_back_to_target() {
    assert_eq!(inline("[[page|]]")[0], wiki("page", "page"));
}

#[test]
fn label_keeps_later_pipes() {
    assert_eq!(inline("[[a|b|c]]")[0], wiki("a", "b|c"));
}

#[test]
fn escaped_pipe_is_part_of_target() {
    assert_eq!(inline(r"[[a\|b]]")[0], wiki("a|b", "a|b"));
}

#[test]
fn unclosed_is_text() {
    assert_eq!(inline("[[target"), vec![Event::Text("[[target".into())]);
    assert_eq!(inline("[[target]"), vec![Event::Text("[[target]".into())]);
}

#[test]
fn blank_target_is_text() {
    assert_eq!(inline("[[ |label]]"), vec![Event::Text("[[ |label]]".into())]);
    assert_eq!(inline("[[]]"), vec![Event::Text("[[]]".into())]);
}

#[test]
fn line_break_inside_is_text() {
    let events = inline("[[a\nb]]");
    assert!(!events.iter().any(|e| matches!(e, Event::Start(Tag::WikiLink { .. }))));
    assert!(events.contains(&Event::SoftBreak));
}

#[test]
fn inside_strong() {
    assert_eq!(
        inline("**bold [[a|b]] text**"),
        vec![
            Event::Start(Tag::Strong),
            Event::Text("bold ".into()),
            wiki("a", "b"),
            Event::Text("b".into()),
            Event::End(TagEnd::WikiLink),
            Event::Text(" text".into()),
            Event::End(TagEnd::Strong),
        ]
    );
}

#[test]
fn innermost_wins() {
    assert_eq!(
        inline("[[a [[b]] c]]"),
        vec![
            Event::Text("[[a ".into()),
            wiki("b", "b"),
            Event::Text("b".into()),
            Event::End(TagEnd::WikiLink),
            Event::Text(" c]]".into()),
        ]
    );
}

#[test]
fn extra_brackets_stay_literal() {
    assert_eq!(
        inline("[[[x]]]"),
        vec![
            Event::Text("[".into()),
            wiki("x", "x"),
            Event::Text("x".into()),
            Event::End(TagEnd::WikiLink),
            Event::Text("]".into()),
        ]
    );
}

#[test]
fn bang_prefix_is_literal() {
    assert_eq!(inline("![[x]]")[0], Event::Text("!".into()));
    assert_eq!(inline("![[x]]")[1], wiki("x", "x"));
}

#[test]
fn code_span_takes_precedence() {
    assert_eq!(inline("`[[a]]`"), vec![Event::Code("[[a]]".into())]);
}

#[test]
fn wikilink_beats_link_brackets() {
    let events = inline("[[a]](/url)");
    assert_eq!(events[0], wiki("a", "a"));
    assert_eq!(events[3], Event::Text("(/url)".into()));
}

#[test]
fn link_text_may_not_contain_wikilink() {
    assert_eq!(
        inline("[see [[a]]](/url)"),
        vec![
            Event::Text("[see ".into()),
            wiki("a", "a"),
            Event::Text("a".into()),
            Event::End(TagEnd::WikiLink),
            Event::Text("](/url)".into()),
        ]
    );
}

#[test]
fn image_alt_may_contain_wikilink() {
    let events = inline("![see [[a]]](/img)");
    assert!(matches!(events[0], Event::Start(Tag::Image { .. })));
    assert_eq!(events[2], wiki("a", "a"));
    assert_eq!(events.last(), Some(&Event::End(TagEnd::Image)));
}

#[test]
fn link_destination_may_not_swallow_wikilink() {
    let events = inline("[a](<[[b]]>)");
    assert!(!events.iter().any(|e| matches!(e, Event::Start(Tag::Link { .. }))));
    assert!(events.contains(&wiki("b", "b")));
}

#[test]
fn entities_are_not_decoded_in_targets() {
    assert_eq!(inline("[[a&amp;b]]")[0], wiki("a&amp;b", "a&amp;b"));
}

#[test]
fn disabled() {
    let options = Options {
        wikilinks: false,
        ..Options::default()
    };
    let events: Vec<_> = Parser::new_ext("[[target]]", options).collect();
    assert_eq!(
        events,
        vec![
            Event::Start(Tag::Paragraph),
            Event::Text("[[target]]".into()),
            Event::End(TagEnd::Paragraph),
        ]
    );
}

#[test]
fn offsets_cover_the_whole_link() {
    let ranges: Vec<_> = Parser::new("x [[a|b]]").into_offset_iter().collect();
    assert_eq!(ranges[2], (wiki("a", "b"), 2..9));
    assert_eq!(ranges[3], (Event::Text("b".into()), 2..9));
}
