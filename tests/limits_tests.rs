use wikimark::limits::{MAX_BLOCK_NESTING, MAX_BRACKET_DEPTH, MAX_INLINE_MARKS};
use wikimark::{parse, parse_strict, Error, Event, LimitKind, Options, Parser, Tag};

fn assert_balanced(events: &[Event<'_>]) {
    let mut stack = Vec::new();
    for event in events {
        match event {
            Event::Start(tag) => stack.push(tag.to_end()),
            Event::End(end) => assert_eq!(stack.pop(), Some(*end)),
            _ => {}
        }
    }
    assert!(stack.is_empty());
}

fn limit_kinds(input: &str) -> Vec<LimitKind> {
    let mut parser = Parser::new(input);
    parser.by_ref().for_each(drop);
    parser.limits_exceeded().iter().map(|l| l.kind).collect()
}

#[test]
fn deep_block_quotes_degrade_to_text() {
    let input = format!("{}deep", ">".repeat(200));
    let events = parse(&input);
    assert_balanced(&events);

    let quotes = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::BlockQuote)))
        .count();
    assert!(quotes > 0 && quotes < MAX_BLOCK_NESTING);
    assert!(events.iter().any(|e| matches!(e, Event::Text(t) if t.contains(">deep"))));
    assert_eq!(limit_kinds(&input), vec![LimitKind::BlockNesting]);
}

#[test]
fn deep_lists_are_bounded() {
    let input: String = (0..100).map(|i| format!("{}- x\n", "  ".repeat(i))).collect();
    let events = parse(&input);
    assert_balanced(&events);
    let lists = events
        .iter()
        .filter(|e| matches!(e, Event::Start(Tag::List { .. })))
        .count();
    assert!(lists < MAX_BLOCK_NESTING);
    assert!(limit_kinds(&input).contains(&LimitKind::BlockNesting));
}

#[test]
fn strict_reports_nesting() {
    let input = ">".repeat(MAX_BLOCK_NESTING * 2);
    match parse_strict(&input, &Options::default()) {
        Err(Error::Limit(limit)) => {
            assert_eq!(limit.kind, LimitKind::BlockNesting);
            assert_eq!(limit.limit, MAX_BLOCK_NESTING);
        }
        other => panic!("expected a nesting limit, got {other:?}"),
    }
}

#[test]
fn bracket_depth() {
    let input = format!("{}a", "[".repeat(MAX_BRACKET_DEPTH + 10));
    let events = parse(&input);
    assert_balanced(&events);
    let err = parse_strict(&input, &Options::default()).unwrap_err();
    let Error::Limit(limit) = err;
    assert_eq!(limit.kind, LimitKind::BracketDepth);
    assert_eq!(limit.offset, MAX_BRACKET_DEPTH);
}

#[test]
fn inline_mark_count() {
    let input = "*a".repeat(MAX_INLINE_MARKS + 100);
    let events = parse(&input);
    assert_balanced(&events);
    assert_eq!(limit_kinds(&input), vec![LimitKind::InlineMarks]);
}

#[test]
fn limit_offsets_are_source_offsets() {
    let input = format!("para\n\n> x\n\n{}", "[".repeat(MAX_BRACKET_DEPTH + 1));
    let mut parser = Parser::new(&input);
    parser.by_ref().for_each(drop);
    let limits = parser.limits_exceeded();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].offset, 11 + MAX_BRACKET_DEPTH);
}

#[test]
fn within_limits_is_ok() {
    let input = "> > nested\n\n- a\n  - b\n\n[[link]] and [x](/y)";
    assert!(parse_strict(input, &Options::default()).is_ok());
}

#[test]
fn pathological_inputs_terminate() {
    let inputs = [
        "*".repeat(20_000),
        "_a".repeat(10_000),
        "[a](".repeat(5_000),
        "[[".repeat(10_000),
        "]]".repeat(10_000),
        "`".repeat(10_000),
        "<a ".repeat(5_000),
        "a\n".repeat(10_000),
        "- ".repeat(5_000),
        ">".repeat(50_000),
        "\\".repeat(10_000),
        "&#".repeat(10_000),
        "**a [[b|".repeat(3_000),
    ];
    for input in &inputs {
        let events = parse(input);
        assert_balanced(&events);
    }
}
