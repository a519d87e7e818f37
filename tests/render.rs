//! Offline integration tests: markup in, document (and .docx bytes) out.
//!
//! Nothing here talks to an LLM; every run uses `preformatted` or calls the
//! pure pipeline directly.

use std::io::{Cursor, Read};
use transcript_docx::export::{DocxSerializer, TextPreviewSerializer};
use transcript_docx::pipeline::classify::{classify, Category, LinePosition};
use transcript_docx::pipeline::cleanup::clean;
use transcript_docx::pipeline::input::{extract_docx_text, load_docx_document};
use transcript_docx::pipeline::spans::{split_spans, SemanticTag, SpanStyle};
use transcript_docx::style::DEFAULT_FOOTER;
use transcript_docx::{
    build_document, format_file, format_to_file, DocumentSerializer, FormatConfig, MarkupWarning,
    OutputBlock, OutputFormat, StyleSheet,
};

const SERMON: &str = "```markdown
**Living in the Last Days**

**Dr. Billy Wilson:** Welcome to **World Impact**. Tonight we read **2 Timothy 3:1**.

──────────

**1. Perilous Times**

Paul writes, *This know also, that in the last days perilous times shall come, for men shall be lovers of their own selves*.

♪ Give Me Jesus ♪
♪ ♪

**Announcer:** Iâ€™m glad you joined us.
──────────
```";

fn preformatted() -> FormatConfig {
    FormatConfig::builder().preformatted(true).build().unwrap()
}

fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

// ── Core scenarios ───────────────────────────────────────────────────────────

#[test]
fn speaker_line_spans() {
    let line = "**Dr. Billy Wilson:** Welcome to **World Impact**.";
    let category = classify(
        line,
        LinePosition {
            line_index: 4,
            blocks_so_far: 6,
        },
    );
    assert_eq!(category, Category::SpeakerHeader);

    let spans = split_spans(line);
    let shapes: Vec<(&str, SpanStyle)> = spans.iter().map(|s| (s.text.as_str(), s.style)).collect();
    assert_eq!(
        shapes,
        vec![
            ("Dr. Billy Wilson:", SpanStyle::Bold),
            (" Welcome to ", SpanStyle::Plain),
            ("World Impact", SpanStyle::Bold),
            (".", SpanStyle::Plain),
        ]
    );
    assert_eq!(spans[2].tag, SemanticTag::None);
}

#[test]
fn scripture_reference_is_tagged() {
    let spans = split_spans("Read **John 3:16** tonight.");
    let verse = spans.iter().find(|s| s.text == "John 3:16").unwrap();
    assert_eq!(verse.style, SpanStyle::Bold);
    assert_eq!(verse.tag, SemanticTag::ScriptureReference);
}

#[test]
fn blank_separated_dividers_collapse() {
    let out = build_document("──────────\n\n──────────\n\nTitle Line", "", &preformatted()).unwrap();
    let blocks = &out.document.blocks;
    assert!(!blocks.first().unwrap().is_rule());
    for pair in blocks.windows(2) {
        assert!(!(pair[0].is_rule() && pair[1].is_rule()));
    }
    assert!(out
        .warnings
        .contains(&MarkupWarning::CollapsedDivider { line: 3 }));
}

#[test]
fn stray_double_star_is_literal() {
    assert_eq!(classify("**", LinePosition::default()), Category::Plain);
    let spans = split_spans("**");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "**");
    assert_eq!(spans[0].style, SpanStyle::Plain);
}

#[test]
fn mojibake_apostrophe_is_repaired() {
    assert_eq!(clean("Iâ€™m here"), "I'm here");
}

// ── Whole documents ──────────────────────────────────────────────────────────

#[test]
fn sermon_renders_every_block_kind() {
    let style = StyleSheet::default();
    let out = build_document(SERMON, "Fallback", &preformatted()).unwrap();
    let doc = &out.document;

    assert_eq!(doc.title.as_ref().unwrap().text(), "Living in the Last Days");
    assert!(!doc.blocks.last().unwrap().is_rule());
    assert!(out
        .warnings
        .iter()
        .any(|w| matches!(w, MarkupWarning::DroppedBoundaryDivider { .. })));

    let heading = doc
        .blocks
        .iter()
        .find_map(|b| match b {
            OutputBlock::Heading(h) => Some(h),
            _ => None,
        })
        .unwrap();
    assert_eq!(heading.text, "1. Perilous Times");

    let runs: Vec<_> = doc
        .blocks
        .iter()
        .filter_map(|b| match b {
            OutputBlock::Paragraph(p) => Some(p),
            _ => None,
        })
        .flat_map(|p| p.runs.iter())
        .collect();
    let verse = runs.iter().find(|r| r.text == "2 Timothy 3:1").unwrap();
    assert_eq!(verse.color, style.scripture_color);
    let lyric = runs.iter().find(|r| r.text.contains("Give Me Jesus")).unwrap();
    assert!(lyric.italic);
    assert_eq!(lyric.color, style.lyric_color);
    assert!(runs.iter().any(|r| r.text.contains("I'm glad you joined us.")));
}

#[test]
fn cleaned_markup_is_stable() {
    let out = build_document(SERMON, "", &preformatted()).unwrap();
    assert_eq!(clean(&out.markup), out.markup);
    assert!(!out.markup.starts_with("```"));
}

#[test]
fn docx_contains_document_parts() {
    let out = build_document(SERMON, "", &preformatted()).unwrap();
    let bytes = DocxSerializer.serialize(&out.document).unwrap();

    let document = zip_entry(&bytes, "word/document.xml");
    assert!(document.contains("Living in the Last Days"));
    assert!(document.contains("2 Timothy 3:1"));
    assert!(document.contains("<w:i/>"));
    let footer = zip_entry(&bytes, "word/footer1.xml");
    assert!(footer.contains(DEFAULT_FOOTER));

    let text = extract_docx_text(&bytes).unwrap();
    assert!(text.starts_with("Living in the Last Days\n"));
    assert!(text.contains("Dr. Billy Wilson: Welcome to World Impact."));
}

#[test]
fn text_preview_lists_blocks() {
    let out = build_document(SERMON, "", &preformatted()).unwrap();
    let preview = TextPreviewSerializer.preview(&out.document);
    assert!(preview.starts_with("[CENTER] **Living in the Last Days**\n"));
    assert!(preview.contains("[H1] 1. Perilous Times"));
    assert!(preview.contains("**Dr. Billy Wilson:**"));
}

// ── Files ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn docx_transcript_can_be_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.docx");
    format_to_file_from_markup(dir.path(), SERMON, &first).await;

    let again = format_file(&first, &preformatted()).await.unwrap();
    assert_eq!(again.document.title.as_ref().unwrap().text(), "first");
    assert!(again
        .markup
        .contains("Dr. Billy Wilson: Welcome to World Impact."));
}

#[tokio::test]
async fn written_docx_displays_with_markers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sermon.docx");
    let out = {
        let input = dir.path().join("source.md");
        std::fs::write(&input, SERMON).unwrap();
        format_to_file(&input, &path, None, &preformatted()).await.unwrap()
    };

    let doc = load_docx_document(&path, &StyleSheet::default()).await.unwrap();
    let preview = TextPreviewSerializer.preview(&doc);
    assert!(preview.starts_with("[CENTER] **Living in the Last Days**\n"), "{preview}");
    assert!(preview.contains("[H1] 1. Perilous Times"));
    assert!(preview.contains("**Dr. Billy Wilson:** Welcome to **World Impact**."));
    assert!(preview.contains(&format!("[FOOTER] {DEFAULT_FOOTER}")));
    assert_eq!(preview, TextPreviewSerializer.preview(&out.document));
}

#[tokio::test]
async fn output_format_follows_argument_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("talk.md");
    std::fs::write(&input, "**Talk**\n\nBody text.").unwrap();
    let out_path = dir.path().join("talk.out");

    format_to_file(&input, &out_path, Some(OutputFormat::Text), &preformatted())
        .await
        .unwrap();
    let preview = std::fs::read_to_string(&out_path).unwrap();
    assert!(preview.starts_with("[CENTER] **Talk**"));
}

#[tokio::test]
async fn unsupported_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("talk.pdf");
    std::fs::write(&input, "%PDF-1.7").unwrap();
    let err = format_file(&input, &preformatted()).await.unwrap_err();
    assert!(err.to_string().contains("Unsupported input"), "{err}");
}

async fn format_to_file_from_markup(dir: &std::path::Path, markup: &str, out: &std::path::Path) {
    let input = dir.join("source.md");
    std::fs::write(&input, markup).unwrap();
    format_to_file(&input, out, None, &preformatted()).await.unwrap();
}
