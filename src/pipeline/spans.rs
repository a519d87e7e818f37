//! Inline span splitting: `**bold**` and `*italic*` regions of one line.
//!
//! The splitter turns one markup line into an ordered list of [`Span`]s that
//! covers the whole line with no gaps and no overlaps. Each styled region
//! loses its own delimiters exactly once; every other character, including
//! stray `*`s that never found a partner, is kept as literal plain text.
//!
//! ## Algorithm
//!
//! 1. Bold regions: every non-greedy `**…**` match.
//! 2. Italic regions: lone `*` characters (not touching another `*`) outside
//!    bold regions, paired left to right.
//! 3. Italic regions that overlap a bold region are discarded. There is no
//!    nested styling; bold wins.
//! 4. Walk left to right, emitting plain gaps and styled regions.
//! 5. Tag bold spans that look like Scripture references and italic spans
//!    that are long quotations.

use crate::style::{BookIndex, StyleSheet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStyle {
    Plain,
    Bold,
    Italic,
}

impl SpanStyle {
    /// Bytes of delimiter on each side of a region with this style.
    pub fn delimiter_len(self) -> usize {
        match self {
            SpanStyle::Plain => 0,
            SpanStyle::Bold => 2,
            SpanStyle::Italic => 1,
        }
    }
}

/// Annotation orthogonal to [`SpanStyle`], used to pick a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SemanticTag {
    #[default]
    None,
    ScriptureReference,
    LongQuote,
}

/// One contiguous run of text with one formatting intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    pub tag: SemanticTag,
    /// Byte range in the source line, delimiters included.
    pub range: Range<usize>,
}

impl Span {
    fn new(text: impl Into<String>, style: SpanStyle, range: Range<usize>) -> Self {
        Self {
            text: text.into(),
            style,
            tag: SemanticTag::None,
            range,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.style == SpanStyle::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.style == SpanStyle::Italic
    }
}

/// Result of splitting one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLine {
    pub spans: Vec<Span>,
    /// Some delimiter characters could not be paired and were kept literally.
    pub unbalanced: bool,
}

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static RE_VERSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+:\d+|\d+--\d+").unwrap());

/// Splitter for the default style sheet, shared by [`split_spans`].
static DEFAULT_SPLITTER: Lazy<SpanSplitter> = Lazy::new(|| SpanSplitter::new(&StyleSheet::default()));

/// Splits lines using the tagging thresholds of one [`StyleSheet`].
#[derive(Debug, Clone)]
pub struct SpanSplitter {
    books: BookIndex,
    long_quote_chars: usize,
}

impl Default for SpanSplitter {
    fn default() -> Self {
        DEFAULT_SPLITTER.clone()
    }
}

impl SpanSplitter {
    pub fn new(style: &StyleSheet) -> Self {
        Self {
            books: style.book_index(),
            long_quote_chars: style.long_quote_chars,
        }
    }

    /// Split `line` into covering spans.
    pub fn split(&self, line: &str) -> Vec<Span> {
        self.split_line(line).spans
    }

    /// Split `line` and report whether any delimiters were left unpaired.
    pub fn split_line(&self, line: &str) -> SplitLine {
        let mut regions = bold_regions(line);
        let italics: Vec<Region> = italic_regions(line, &regions)
            .into_iter()
            .filter(|it| !regions.iter().any(|b| overlaps(&b.outer, &it.outer)))
            .collect();
        regions.extend(italics);
        regions.sort_by_key(|r| r.outer.start);

        let mut pieces: Vec<Span> = Vec::with_capacity(regions.len() * 2 + 1);
        let mut last = 0;
        for region in &regions {
            if region.outer.start > last {
                pieces.push(Span::new(
                    &line[last..region.outer.start],
                    SpanStyle::Plain,
                    last..region.outer.start,
                ));
            }
            let mut span = Span::new(
                &line[region.inner.clone()],
                region.style,
                region.outer.clone(),
            );
            span.tag = self.tag_for(&span);
            pieces.push(span);
            last = region.outer.end;
        }
        if last < line.len() {
            pieces.push(Span::new(&line[last..], SpanStyle::Plain, last..line.len()));
        }

        let unbalanced = pieces
            .iter()
            .any(|p| p.style == SpanStyle::Plain && p.text.contains('*'));

        SplitLine {
            spans: normalise(pieces, line.len()),
            unbalanced,
        }
    }

    fn tag_for(&self, span: &Span) -> SemanticTag {
        match span.style {
            SpanStyle::Bold if self.is_scripture_reference(&span.text) => {
                SemanticTag::ScriptureReference
            }
            SpanStyle::Italic if span.text.chars().count() > self.long_quote_chars => {
                SemanticTag::LongQuote
            }
            _ => SemanticTag::None,
        }
    }

    /// Verse numbers (`3:16`, `1--5`) or a whole-token canonical book name.
    pub fn is_scripture_reference(&self, text: &str) -> bool {
        RE_VERSE.is_match(text) || self.books.mentions_book(text)
    }
}

/// Split `line` with the default style sheet.
pub fn split_spans(line: &str) -> Vec<Span> {
    DEFAULT_SPLITTER.split(line)
}

/// True when no span carries visible text, e.g. for `****` or `** **`.
pub fn is_markup_only(spans: &[Span]) -> bool {
    spans.iter().all(|s| s.text.trim().is_empty())
}

/// Concatenated span text: the line with styled-region delimiters removed.
pub fn strip_markup(line: &str) -> String {
    split_spans(line).into_iter().map(|s| s.text).collect()
}

// ── Region detection ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Region {
    style: SpanStyle,
    /// Including delimiters.
    outer: Range<usize>,
    /// Content only.
    inner: Range<usize>,
}

fn bold_regions(line: &str) -> Vec<Region> {
    RE_BOLD
        .captures_iter(line)
        .filter_map(|caps| {
            let outer = caps.get(0)?.range();
            let inner = caps.get(1)?.range();
            Some(Region {
                style: SpanStyle::Bold,
                outer,
                inner,
            })
        })
        .collect()
}

fn italic_regions(line: &str, bold: &[Region]) -> Vec<Region> {
    let bytes = line.as_bytes();
    let lone: Vec<usize> = bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| {
            b == b'*'
                && (i == 0 || bytes[i - 1] != b'*')
                && bytes.get(i + 1) != Some(&b'*')
                && !bold.iter().any(|r| r.outer.contains(&i))
        })
        .map(|(i, _)| i)
        .collect();

    lone.chunks_exact(2)
        .map(|pair| Region {
            style: SpanStyle::Italic,
            outer: pair[0]..pair[1] + 1,
            inner: pair[0] + 1..pair[1],
        })
        .collect()
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Drop empty styled pieces (their bytes go to a neighbour), merge adjacent
/// plain pieces, and fall back to one empty plain span for markup-only lines.
fn normalise(pieces: Vec<Span>, line_len: usize) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(pieces.len());
    let mut pending_start: Option<usize> = None;

    for mut piece in pieces {
        if piece.text.is_empty() {
            match out.last_mut() {
                Some(prev) => prev.range.end = piece.range.end,
                None => {
                    pending_start.get_or_insert(piece.range.start);
                }
            }
            continue;
        }
        if let Some(start) = pending_start.take() {
            piece.range.start = start;
        }
        match out.last_mut() {
            Some(prev) if prev.style == SpanStyle::Plain && piece.style == SpanStyle::Plain => {
                prev.text.push_str(&piece.text);
                prev.range.end = piece.range.end;
            }
            _ => out.push(piece),
        }
    }

    if out.is_empty() {
        out.push(Span::new(String::new(), SpanStyle::Plain, 0..line_len));
    }
    out
}
