//! Document rendering: classified markup lines → [`OutputDocument`].
//!
//! The renderer is a pure fold over the line stream. It never fails: every
//! irregularity it meets is resolved by a fixed rule and reported as a
//! [`MarkupWarning`].
//!
//! ## Block invariants
//!
//! * no two [`OutputBlock::Empty`] blocks are adjacent;
//! * no two [`OutputBlock::Rule`] blocks are adjacent, even with `Empty`
//!   blocks between them;
//! * the body never starts or ends with a `Rule` (or an `Empty`). A divider
//!   directly above the title is kept as [`TitleBlock::rule_before`] instead.
//!
//! Title, footer and trailer are page-level metadata, not body blocks, so an
//! all-blank input renders to a document with zero blocks.

use crate::document::{Alignment, HeadingBlock, OutputBlock, OutputDocument, Paragraph, Run, TitleBlock};
use crate::error::MarkupWarning;
use crate::pipeline::classify::{classify_content, is_only_notes, speaker_label_end, strip_wrapping, Category};
use crate::pipeline::scan::{scan_with, MarkupLine};
use crate::pipeline::spans::{is_markup_only, SemanticTag, Span, SpanSplitter, SpanStyle};
use crate::style::StyleSheet;
use tracing::debug;

/// A rendered document plus the irregularities met on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub document: OutputDocument,
    /// Sorted by line number.
    pub warnings: Vec<MarkupWarning>,
}

/// Render already-classified lines with `style`.
pub fn render(lines: &[MarkupLine], fallback_title: &str, style: &StyleSheet) -> Rendered {
    Renderer::new(style).render(lines, fallback_title)
}

/// Scan and render cleaned markup in one step.
pub fn render_markup(markup: &str, fallback_title: &str, style: &StyleSheet) -> Rendered {
    Renderer::new(style).render_markup(markup, fallback_title)
}

/// Renderer bound to one [`StyleSheet`].
pub struct Renderer<'a> {
    style: &'a StyleSheet,
    splitter: SpanSplitter,
}

/// A body block and the 1-based source line that produced it.
struct Placed {
    block: OutputBlock,
    line: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(style: &'a StyleSheet) -> Self {
        Self {
            style,
            splitter: SpanSplitter::new(style),
        }
    }

    pub fn render_markup(&self, markup: &str, fallback_title: &str) -> Rendered {
        let scan = scan_with(markup, &self.splitter);
        let mut rendered = self.render(&scan.lines, fallback_title);
        rendered.warnings.extend(scan.warnings);
        rendered.warnings.sort_by_key(MarkupWarning::line);
        rendered
    }

    pub fn render(&self, lines: &[MarkupLine], fallback_title: &str) -> Rendered {
        let mut doc = OutputDocument::new(self.style);
        let mut body: Vec<Placed> = Vec::with_capacity(lines.len());
        let mut warnings = Vec::new();

        for line in lines {
            let number = line.line_number();
            let trimmed = line.raw_text.trim();
            let mut category = line.category;

            if category == Category::Title && doc.title.is_some() {
                category = classify_content(trimmed);
                warnings.push(MarkupWarning::DemotedTitle { line: number });
            }

            match category {
                Category::Blank => push_empty(&mut body, number),
                Category::Divider => {
                    if last_visible(&body).is_some_and(OutputBlock::is_rule) {
                        debug!("Line {}: collapsing consecutive divider", number);
                        warnings.push(MarkupWarning::CollapsedDivider { line: number });
                    } else {
                        body.push(Placed {
                            block: OutputBlock::Rule,
                            line: number,
                        });
                    }
                }
                Category::Title => {
                    let rule_before = take_rule_before_title(&mut body);
                    doc.title = Some(self.title_block(&strip_wrapping(trimmed), rule_before));
                }
                Category::SpeakerHeader => self.push_block(
                    &mut body,
                    number,
                    OutputBlock::Paragraph(self.speaker_paragraph(line)),
                ),
                Category::SectionHeader => self.push_block(
                    &mut body,
                    number,
                    OutputBlock::Heading(self.heading(&line.spans)),
                ),
                Category::LyricLine => self.push_block(
                    &mut body,
                    number,
                    OutputBlock::Paragraph(self.lyric_paragraph(trimmed, &line.spans)),
                ),
                Category::Plain if is_markup_only(&line.spans) => {
                    push_empty(&mut body, number);
                }
                Category::Plain => {
                    let runs = self.line_runs(&line.spans, true);
                    self.push_block(
                        &mut body,
                        number,
                        OutputBlock::Paragraph(Paragraph::new(
                            Alignment::Left,
                            self.style.body_spacing_after,
                            runs,
                        )),
                    );
                }
            }
        }

        if doc.title.is_none() && !fallback_title.trim().is_empty() {
            doc.title = Some(self.title_block(fallback_title.trim(), false));
        }

        trim_boundaries(&mut body, &mut warnings);
        doc.blocks = body.into_iter().map(|p| p.block).collect();
        warnings.sort_by_key(MarkupWarning::line);

        Rendered {
            document: doc,
            warnings,
        }
    }

    fn push_block(&self, body: &mut Vec<Placed>, line: usize, block: OutputBlock) {
        body.push(Placed { block, line });
    }

    // ── Per-category builders ────────────────────────────────────────────────

    fn title_block(&self, text: &str, rule_before: bool) -> TitleBlock {
        let run = Run::body(text, self.style)
            .bold()
            .underline()
            .font(self.style.title_font.clone())
            .size(self.style.title_size);
        TitleBlock {
            run,
            spacing_after: self.style.title_spacing_after,
            rule_before,
        }
    }

    /// Bold label, then the line's own spans from the end of the label on.
    ///
    /// A bold region that starts inside the label keeps its style past the
    /// colon, so `**Billy: The Sermon** text` never shows a literal `**`.
    fn speaker_paragraph(&self, line: &MarkupLine) -> Paragraph {
        let raw = line.raw_text.as_str();
        let indent = raw.len() - raw.trim_start().len();
        let label_end = speaker_label_end(raw.trim())
            .map(|end| indent + end)
            .unwrap_or(raw.len());
        let label = raw[..label_end].replace('*', "");
        let rest: Vec<Span> = line
            .spans
            .iter()
            .filter_map(|span| span_after(span, label_end))
            .collect();

        let mut runs = vec![Run::body(label.trim(), self.style).bold()];
        runs.extend(self.line_runs(&rest, false));
        Paragraph::new(Alignment::Left, self.style.body_spacing_after, runs)
    }

    fn heading(&self, spans: &[Span]) -> HeadingBlock {
        let text: String = spans.iter().map(|s| s.text.as_str()).collect();
        HeadingBlock {
            level: 1,
            text: text.trim().to_string(),
            font_family: self.style.heading_font.clone(),
            font_size: self.style.heading_size,
            spacing_before: self.style.heading_spacing_before,
            spacing_after: self.style.heading_spacing_after,
        }
    }

    fn lyric_paragraph(&self, trimmed: &str, spans: &[Span]) -> Paragraph {
        if is_only_notes(trimmed) {
            return Paragraph::new(Alignment::Center, 0.0, vec![Run::body(trimmed, self.style)]);
        }
        let text: String = spans.iter().map(|s| s.text.as_str()).collect();
        let text = text
            .trim_start()
            .trim_end_matches(|c: char| c == '♪' || c.is_whitespace());
        let run = Run::body(text, self.style)
            .italic()
            .color(self.style.lyric_color);
        Paragraph::new(Alignment::Left, 0.0, vec![run])
    }

    /// One run per non-empty span of a source line. Plain text at the end of
    /// the line (and at its start when `trim_start` is set) loses the
    /// surrounding whitespace, so indentation never reaches the document.
    fn line_runs(&self, spans: &[Span], trim_start: bool) -> Vec<Run> {
        let last = spans.len().saturating_sub(1);
        spans
            .iter()
            .enumerate()
            .filter_map(|(i, span)| {
                let mut text = span.text.as_str();
                if span.style == SpanStyle::Plain {
                    if i == 0 && trim_start {
                        text = text.trim_start();
                    }
                    if i == last {
                        text = text.trim_end();
                    }
                }
                (!text.is_empty()).then(|| self.run(text, span))
            })
            .collect()
    }

    fn run(&self, text: &str, span: &Span) -> Run {
        let run = Run::body(text, self.style);
        match (span.style, span.tag) {
            (SpanStyle::Bold, SemanticTag::ScriptureReference) => {
                run.bold().color(self.style.scripture_color)
            }
            (SpanStyle::Bold, _) => run.bold(),
            (SpanStyle::Italic, SemanticTag::LongQuote) => run.italic().color(self.style.quote_color),
            (SpanStyle::Italic, _) => run.italic(),
            (SpanStyle::Plain, _) => run,
        }
    }
}

/// The part of `span` that lies after byte `offset` of its line.
fn span_after(span: &Span, offset: usize) -> Option<Span> {
    if span.range.end <= offset {
        return None;
    }
    if span.range.start >= offset {
        return Some(span.clone());
    }
    let inner_start = span.range.start + span.style.delimiter_len();
    let text = span.text.get(offset.saturating_sub(inner_start)..)?;
    Some(Span {
        text: text.to_string(),
        style: span.style,
        tag: span.tag,
        range: offset..span.range.end,
    })
}

// ── Block bookkeeping ────────────────────────────────────────────────────────

fn push_empty(body: &mut Vec<Placed>, line: usize) {
    if !body.last().is_some_and(|p| p.block.is_empty_block()) {
        body.push(Placed {
            block: OutputBlock::Empty,
            line,
        });
    }
}

/// The last block that is not vertical spacing.
fn last_visible(body: &[Placed]) -> Option<&OutputBlock> {
    body.iter()
        .rev()
        .map(|p| &p.block)
        .find(|b| !b.is_empty_block())
}

/// If the body currently ends in a divider (ignoring spacing), move it onto
/// the title.
fn take_rule_before_title(body: &mut Vec<Placed>) -> bool {
    if !last_visible(body).is_some_and(OutputBlock::is_rule) {
        return false;
    }
    while body.last().is_some_and(|p| p.block.is_empty_block()) {
        body.pop();
    }
    body.pop();
    true
}

/// Drop spacing and dividers from both ends of the body.
fn trim_boundaries(body: &mut Vec<Placed>, warnings: &mut Vec<MarkupWarning>) {
    let leading = body
        .iter()
        .take_while(|p| p.block.is_rule() || p.block.is_empty_block())
        .count();
    for placed in body.drain(..leading) {
        report_dropped(&placed, warnings);
    }

    while body
        .last()
        .is_some_and(|p| p.block.is_rule() || p.block.is_empty_block())
    {
        if let Some(placed) = body.pop() {
            report_dropped(&placed, warnings);
        }
    }
}

fn report_dropped(placed: &Placed, warnings: &mut Vec<MarkupWarning>) {
    if placed.block.is_rule() {
        debug!("Line {}: dropping divider at document boundary", placed.line);
        warnings.push(MarkupWarning::DroppedBoundaryDivider { line: placed.line });
    }
}
