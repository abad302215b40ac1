//! Performance benchmarks for wikimark
//!
//! Run with: cargo bench --bench parsing

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Sample Markdown documents of various sizes
mod samples {
    pub const TINY: &str = "Hello, **world** and [[Home]]!";

    pub const SMALL: &str = r#"# Heading

This is a paragraph with *emphasis* and **strong** text.

- Item 1 links to [[Item One]]
- Item 2 links to [[Item Two|the second]]
- Item 3

`inline code` and [a link](https://example.com).
"#;

    /// Generate a large wiki-style document by repeating sections
    pub fn large() -> String {
        let section = r#"
## Section Title

This paragraph contains various inline elements like *emphasis*, **strong**,
`code`, [links](https://example.com) and wikilinks such as [[Some Page]] or
[[Another Page|with a label]].

- First bullet point with **bold** text
- Second bullet point with *italic* text and [[a link]]
- Third point with `code`

> A blockquote that spans
> multiple lines.

```rust
fn example() {
    let x = 42;
    println!("{}", x);
}
```

Another paragraph to add some content. This helps test the parser's ability
to handle longer documents efficiently.

"#;
        section.repeat(50)
    }

    /// Many potential opener/closer pairs
    pub fn pathological_emphasis() -> String {
        "*a ".repeat(1000) + &"b* ".repeat(1000)
    }

    /// Many wikilink openers without closers
    pub fn pathological_wikilinks() -> String {
        "[[a ".repeat(2000) + &"|b".repeat(2000)
    }

    pub fn pathological_nested() -> String {
        "> ".repeat(100) + "deep\n"
    }
}

fn count_events(input: &str) -> usize {
    wikimark::Parser::new(input).count()
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    group.throughput(Throughput::Bytes(samples::TINY.len() as u64));
    group.bench_function("tiny", |b| b.iter(|| count_events(black_box(samples::TINY))));

    group.throughput(Throughput::Bytes(samples::SMALL.len() as u64));
    group.bench_function("small", |b| b.iter(|| count_events(black_box(samples::SMALL))));

    let large = samples::large();
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("large", |b| b.iter(|| count_events(black_box(&large))));

    group.bench_function("large_with_offsets", |b| {
        b.iter(|| wikimark::Parser::new(black_box(&large)).into_offset_iter().count())
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let large = samples::large();
    let events = wikimark::parse(&large);
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("to_markdown", |b| b.iter(|| wikimark::to_markdown(black_box(&events))));
    group.finish();
}

fn bench_pathological(c: &mut Criterion) {
    let mut group = c.benchmark_group("pathological");
    group.sample_size(20);

    let emphasis = samples::pathological_emphasis();
    group.throughput(Throughput::Bytes(emphasis.len() as u64));
    group.bench_function("emphasis_explosion", |b| b.iter(|| count_events(black_box(&emphasis))));

    let wikilinks = samples::pathological_wikilinks();
    group.throughput(Throughput::Bytes(wikilinks.len() as u64));
    group.bench_function("unclosed_wikilinks", |b| b.iter(|| count_events(black_box(&wikilinks))));

    let nested = samples::pathological_nested();
    group.throughput(Throughput::Bytes(nested.len() as u64));
    group.bench_function("deep_nesting", |b| b.iter(|| count_events(black_box(&nested))));

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_render, bench_pathological);
criterion_main!(benches);
