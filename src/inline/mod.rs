//! Inline parser for Markdown.
//!
//! Uses a three-phase approach:
//! 1. Mark collection: a single pass records every potential delimiter
//! 2. Mark resolution, by precedence: code spans, autolinks and raw HTML,
//!    then wikilinks, then links and images, then emphasis
//! 3. Event emission: resolved constructs become events, the gaps between
//!    them become text

pub mod code_span;
pub mod emphasis;
pub mod event;
pub mod html;
pub mod links;
pub mod marks;
pub mod wikilink;

pub use event::InlineEvent;

use crate::error::LimitKind;
use crate::link_ref::LinkRefStore;
use crate::Range;
use code_span::{resolve_spans, AtomicSpan, SpanKind};
use emphasis::{resolve_emphasis, EmphasisMatch};
use links::{resolve_links, Link};
use marks::{collect_marks, flags, MarkBuffer};
use wikilink::{resolve_wikilinks, WikiLink};

/// Document-level inputs to inline parsing.
#[derive(Debug, Clone, Copy)]
pub struct InlineContext<'r> {
    pub refs: &'r LinkRefStore,
    pub wikilinks: bool,
    pub allow_html: bool,
}

/// A resolved construct waiting to be emitted, covering `pos..end`.
#[derive(Debug, Clone, Copy)]
struct EmitPoint {
    pos: u32,
    end: u32,
    event: InlineEvent,
}

/// Inline parser state. Buffers are reused across calls.
#[derive(Debug, Default)]
pub struct InlineParser {
    marks: MarkBuffer,
    spans: Vec<AtomicSpan>,
    wikilinks: Vec<WikiLink>,
    wiki_starts: Vec<u32>,
    links: Vec<Link>,
    emphasis: Vec<EmphasisMatch>,
    points: Vec<EmitPoint>,
    /// Guards tripped since the last [`drain_limits`](Self::drain_limits),
    /// with the offset in the parsed text.
    limits: Vec<(LimitKind, u32)>,
}

impl InlineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and append `(event, range)` pairs to `events`. Ranges
    /// are relative to `text`.
    pub fn parse(&mut self, text: &str, ctx: InlineContext<'_>, events: &mut Vec<(InlineEvent, Range)>) {
        let bytes = text.as_bytes();
        collect_marks(text, &mut self.marks);
        if let Some(at) = self.marks.overflow_at() {
            log::debug!("{} reached at byte {}", LimitKind::InlineMarks, at);
            self.limits.push((LimitKind::InlineMarks, at));
        }

        if self.marks.is_empty() {
            if !text.is_empty() {
                let all = Range::from_usize(0, text.len());
                events.push((InlineEvent::Text(all), all));
            }
            return;
        }

        resolve_spans(bytes, self.marks.marks_mut(), ctx.allow_html, &mut self.spans);

        if ctx.wikilinks {
            resolve_wikilinks(bytes, self.marks.marks_mut(), &mut self.spans, &mut self.wikilinks);
        } else {
            self.wikilinks.clear();
        }
        self.wiki_starts.clear();
        self.wiki_starts.extend(self.wikilinks.iter().map(|w| w.start));

        if let Some(at) = resolve_links(
            bytes,
            self.marks.marks_mut(),
            ctx.refs,
            &self.wiki_starts,
            &mut self.links,
        ) {
            self.limits.push((LimitKind::BracketDepth, at));
        }

        // Link destinations and titles are not inline content.
        let links = &self.links;
        self.spans
            .retain(|s| !links.iter().any(|l| s.start > l.text_end && s.start < l.end));

        resolve_emphasis(self.marks.marks(), &self.links, &mut self.emphasis);

        self.collect_points(bytes);
        self.emit(text.len(), events);
    }

    /// Guards tripped since the last call, with text offsets.
    pub fn drain_limits(&mut self) -> std::vec::Drain<'_, (LimitKind, u32)> {
        self.limits.drain(..)
    }

    fn collect_points(&mut self, text: &[u8]) {
        let points = &mut self.points;
        points.clear();

        for span in &self.spans {
            let event = match span.kind {
                SpanKind::Code { content } => InlineEvent::Code(content),
                SpanKind::Autolink { content, is_email } => InlineEvent::Autolink { url: content, is_email },
                SpanKind::Html => InlineEvent::Html(span.range()),
            };
            points.push(EmitPoint {
                pos: span.start,
                end: span.end,
                event,
            });
        }

        for w in &self.wikilinks {
            points.push(EmitPoint {
                pos: w.start,
                end: w.end,
                event: InlineEvent::WikiLink {
                    target: w.target,
                    label: w.label,
                },
            });
        }

        for link in &self.links {
            let (start, end) = if link.image {
                (InlineEvent::ImageStart { target: link.target }, InlineEvent::ImageEnd)
            } else {
                (InlineEvent::LinkStart { target: link.target }, InlineEvent::LinkEnd)
            };
            points.push(EmitPoint {
                pos: link.start,
                end: link.text_start,
                event: start,
            });
            points.push(EmitPoint {
                pos: link.text_end,
                end: link.end,
                event: end,
            });
        }

        for m in &self.emphasis {
            let (start, end) = if m.strong {
                (InlineEvent::StrongStart, InlineEvent::StrongEnd)
            } else {
                (InlineEvent::EmphasisStart, InlineEvent::EmphasisEnd)
            };
            points.push(EmitPoint {
                pos: m.opener_start,
                end: m.opener_end,
                event: start,
            });
            points.push(EmitPoint {
                pos: m.closer_start,
                end: m.closer_end,
                event: end,
            });
        }

        for mark in self.marks.marks() {
            if mark.is_consumed() {
                continue;
            }
            let event = match mark.ch {
                b'\\' => {
                    let Some(&escaped) = text.get(mark.pos as usize + 1) else {
                        continue;
                    };
                    InlineEvent::Escaped(escaped)
                }
                b'\n' if mark.has(flags::HARD) => InlineEvent::HardBreak,
                b'\n' => InlineEvent::SoftBreak,
                _ => continue,
            };
            points.push(EmitPoint {
                pos: mark.pos,
                end: mark.end,
                event,
            });
        }

        // Every point covers its own bytes, so start offsets are unique.
        points.sort_unstable_by_key(|p| p.pos);
    }

    fn emit(&self, len: usize, events: &mut Vec<(InlineEvent, Range)>) {
        let mut cursor = 0u32;
        for p in &self.points {
            if p.pos < cursor {
                continue;
            }
            if p.pos > cursor {
                let gap = Range::new(cursor, p.pos);
                events.push((InlineEvent::Text(gap), gap));
            }
            events.push((p.event, Range::new(p.pos, p.end)));
            cursor = p.end;
        }
        if (cursor as usize) < len {
            let tail = Range::from_usize(cursor as usize, len);
            events.push((InlineEvent::Text(tail), tail));
        }
    }
}
