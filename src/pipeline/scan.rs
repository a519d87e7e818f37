//! Scanning: classify every line of a markup document and split its spans.
//!
//! Title detection depends on how many blocks precede a line, so the scanner
//! keeps the same block count the renderer will reach: runs of blank lines
//! (including lines made only of emphasis markers, such as `****`) count
//! once, a divider directly after another divider (blank lines in
//! between do not matter) does not count, and the title counts once. Only
//! the first title candidate becomes the title; later ones are re-classified
//! by the body rules and reported as [`MarkupWarning::DemotedTitle`].

use crate::error::MarkupWarning;
use crate::pipeline::classify::{classify, classify_content, Category, LinePosition};
use crate::pipeline::spans::{is_markup_only, Span, SpanSplitter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One line of formatter output, classified and split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupLine {
    /// 0-based line index.
    pub index: usize,
    pub raw_text: String,
    pub category: Category,
    pub spans: Vec<Span>,
}

impl MarkupLine {
    /// 1-based line number, as used in warnings.
    pub fn line_number(&self) -> usize {
        self.index + 1
    }
}

/// Result of [`scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub lines: Vec<MarkupLine>,
    pub warnings: Vec<MarkupWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emitted {
    Empty,
    Rule,
    Content,
}

/// Classify and split every line of `text` with the default style sheet.
pub fn scan(text: &str) -> Scan {
    scan_with(text, &SpanSplitter::default())
}

pub fn scan_with(text: &str, splitter: &SpanSplitter) -> Scan {
    let mut out = Scan::default();
    let mut blocks_so_far = 0usize;
    let mut last: Option<Emitted> = None;
    let mut last_visible: Option<Emitted> = None;
    let mut title_seen = false;

    for (index, raw) in text.split('\n').enumerate() {
        let position = LinePosition {
            line_index: index,
            blocks_so_far,
        };
        let mut category = classify(raw, position);

        if category == Category::Title {
            if title_seen {
                category = classify_content(raw);
                debug!("Line {}: demoted title candidate to {:?}", index + 1, category);
                out.warnings.push(MarkupWarning::DemotedTitle { line: index + 1 });
            } else {
                title_seen = true;
            }
        }

        // Ranges index into `raw`, indentation included.
        let split = splitter.split_line(raw);

        let emitted = match category {
            Category::Blank => Emitted::Empty,
            Category::Plain if is_markup_only(&split.spans) => Emitted::Empty,
            Category::Divider => Emitted::Rule,
            _ => Emitted::Content,
        };
        let counts = match emitted {
            Emitted::Empty => last != Some(Emitted::Empty),
            Emitted::Rule => last_visible != Some(Emitted::Rule),
            Emitted::Content => true,
        };
        if counts {
            blocks_so_far += 1;
            last = Some(emitted);
        }
        if emitted != Emitted::Empty && counts {
            last_visible = Some(emitted);
        }

        if split.unbalanced
            && matches!(
                category,
                Category::Plain | Category::SpeakerHeader | Category::LyricLine
            )
        {
            debug!("Line {}: unbalanced emphasis delimiters", index + 1);
            out.warnings
                .push(MarkupWarning::UnbalancedDelimiters { line: index + 1 });
        }

        out.lines.push(MarkupLine {
            index,
            raw_text: raw.to_string(),
            category,
            spans: split.spans,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cleanup::clean;

    fn categories(text: &str) -> Vec<Category> {
        scan(text).lines.into_iter().map(|l| l.category).collect()
    }

    #[test]
    fn only_first_title_is_kept() {
        let scan = scan("**Living in the Last Days**\n**Second Bold Line**");
        assert_eq!(scan.lines[0].category, Category::Title);
        assert_eq!(scan.lines[1].category, Category::Plain);
        assert_eq!(scan.warnings, vec![MarkupWarning::DemotedTitle { line: 2 }]);
    }

    #[test]
    fn demoted_bold_speaker_becomes_speaker() {
        let cats = categories("**Title**\n**Announcer:**");
        assert_eq!(cats, vec![Category::Title, Category::SpeakerHeader]);
    }

    #[test]
    fn blank_runs_count_once() {
        // Two paragraphs, then ten blank lines, then a bold line: four blocks
        // (para, empty, para, empty) precede it, so it is still a title.
        let mut text = String::from("one\n\ntwo\n");
        text.push_str(&"\n".repeat(10));
        text.push_str("**Late Title**");
        let cats = categories(&text);
        assert_eq!(cats.last(), Some(&Category::Title));
    }

    #[test]
    fn title_window_closes_after_five_blocks() {
        let cats = categories("a\nb\nc\nd\ne\n**Too Late**");
        assert_eq!(cats.last(), Some(&Category::Plain));
    }

    #[test]
    fn doubled_dividers_count_once() {
        let text = "──────────\n\n──────────\n\nx\ny\n**Still Title**";
        // rule, empty, (rule skipped), (empty coalesced), x, y -> 4 blocks
        let cats = categories(text);
        assert_eq!(cats.last(), Some(&Category::Title));
    }

    #[test]
    fn markup_only_line_counts_as_spacing() {
        // a, <empty for blank and ****>, b, c -> 4 blocks
        let cats = categories("a\n\n****\nb\nc\n**Real Title**\nd");
        assert_eq!(cats[2], Category::Plain);
        assert_eq!(cats[5], Category::Title);
    }

    #[test]
    fn indented_line_spans_cover_raw_text() {
        let scan = scan(&clean("Intro\n  **a** b"));
        let line = &scan.lines[1];
        assert_eq!(line.raw_text, "  **a** b");
        assert_eq!(line.spans.first().map(|s| s.range.start), Some(0));
        assert_eq!(
            line.spans.last().map(|s| s.range.end),
            Some(line.raw_text.len())
        );
        for pair in line.spans.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
        let bold = &line.spans[1];
        assert_eq!(bold.text, "a");
        assert_eq!(&line.raw_text[bold.range.clone()], "**a**");
    }

    #[test]
    fn unbalanced_delimiters_are_reported() {
        let scan = scan("Plain line\nstray * star");
        assert_eq!(
            scan.warnings,
            vec![MarkupWarning::UnbalancedDelimiters { line: 2 }]
        );
    }

    #[test]
    fn spans_attached_to_lines() {
        let scan = scan("Read **John 3:16** tonight.");
        let line = &scan.lines[0];
        assert_eq!(line.category, Category::Plain);
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.line_number(), 1);
    }
}
