//! Input loading: read a transcript file into a `String`.
//!
//! Plain-text transcripts (`.txt`, `.md`, `.text`) must be UTF-8; a leading
//! BOM is left for the cleanup pass to strip. Word transcripts (`.docx`) are
//! unpacked with `zip` and their `word/document.xml` is walked with
//! `quick-xml`, joining the text of every `<w:t>` run and ending each
//! `<w:p>` paragraph with a newline. Tabs and line breaks inside a paragraph
//! become `\t` and `\n`.
//!
//! [`read_docx_document`] goes one step further and reads a Word file back
//! into an [`OutputDocument`], keeping paragraph styles, alignment, divider
//! borders and run emphasis, so an existing `.docx` can be previewed with
//! the same markers as a fresh rendering.

use crate::document::{Alignment, HeadingBlock, OutputBlock, OutputDocument, Paragraph, Run, TitleBlock};
use crate::error::TranscriptError;
use crate::style::{Rgb, StyleSheet};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const FOOTER_PART: &str = "word/footer1.xml";

/// Supported transcript file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Docx,
}

impl InputKind {
    /// Pick the kind from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "md" | "markdown" => Some(InputKind::Text),
            "docx" => Some(InputKind::Docx),
            _ => None,
        }
    }
}

/// A transcript read from disk.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: PathBuf,
    pub kind: InputKind,
    pub text: String,
}

impl LoadedInput {
    /// The file stem, used as the fallback document title.
    pub fn title_hint(&self) -> Option<String> {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.replace(['_', '-'], " ").trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Read and decode the transcript at `path`.
pub async fn load_input(path: impl AsRef<Path>) -> Result<LoadedInput, TranscriptError> {
    let path = path.as_ref().to_path_buf();
    let kind = InputKind::from_path(&path)
        .ok_or_else(|| TranscriptError::UnsupportedInput { path: path.clone() })?;

    let bytes = read_file(&path).await?;

    let text = match kind {
        InputKind::Text => String::from_utf8(bytes)
            .map_err(|_| TranscriptError::InvalidEncoding { path: path.clone() })?,
        InputKind::Docx => extract_docx_text(&bytes).map_err(|detail| {
            TranscriptError::InvalidDocx {
                path: path.clone(),
                detail,
            }
        })?,
    };

    debug!(
        "Loaded {:?} transcript {} ({} chars)",
        kind,
        path.display(),
        text.chars().count()
    );
    Ok(LoadedInput { path, kind, text })
}

/// Read an existing `.docx` at `path` back into a document model.
pub async fn load_docx_document(
    path: impl AsRef<Path>,
    style: &StyleSheet,
) -> Result<OutputDocument, TranscriptError> {
    let path = path.as_ref().to_path_buf();
    if InputKind::from_path(&path) != Some(InputKind::Docx) {
        return Err(TranscriptError::UnsupportedInput { path });
    }
    let bytes = read_file(&path).await?;
    read_docx_document(&bytes, style).map_err(|detail| TranscriptError::InvalidDocx { path, detail })
}

async fn read_file(path: &Path) -> Result<Vec<u8>, TranscriptError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => TranscriptError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => TranscriptError::FileNotFound {
            path: path.to_path_buf(),
        },
    })
}

/// Paragraph text of a `.docx` file, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| format!("{DOCUMENT_PART}: file not found"))?;
    document_xml_text(&xml)
}

fn document_xml_text(xml: &str) -> Result<String, String> {
    let lines: Vec<String> = read_paragraphs(xml, &StyleSheet::default())?
        .iter()
        .map(DocxParagraph::text)
        .collect();
    Ok(lines.join("\n").trim_end_matches('\n').to_string())
}

/// A Word file as a document model.
///
/// Paragraph style `Title` becomes the title (a divider directly above it
/// becomes [`TitleBlock::rule_before`]), `HeadingN` a heading, a paragraph
/// with a border and no text a rule, and a text-less paragraph spacing.
/// A final paragraph whose text is `style`'s trailer becomes the trailer.
/// The footer comes from `word/footer1.xml` and is empty when that part is
/// missing. Fonts, sizes and colors the file does not set fall back to
/// `style`.
pub fn read_docx_document(bytes: &[u8], style: &StyleSheet) -> Result<OutputDocument, String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let body = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| format!("{DOCUMENT_PART}: file not found"))?;

    let mut doc = OutputDocument::new(style);
    doc.trailer = None;
    doc.footer = match read_part(&mut archive, FOOTER_PART)? {
        Some(xml) => footer_run(&read_paragraphs(&xml, style)?, style),
        None => Run::body("", style),
    };

    for para in read_paragraphs(&body, style)? {
        let text = para.text();
        let text = text.trim();
        if para.border && text.is_empty() {
            let after_rule = doc
                .blocks
                .iter()
                .rev()
                .find(|b| !b.is_empty_block())
                .is_some_and(OutputBlock::is_rule);
            if !after_rule {
                doc.blocks.push(OutputBlock::Rule);
            }
            continue;
        }
        let heading_level = para
            .style_id
            .as_deref()
            .and_then(|id| id.strip_prefix("Heading"))
            .and_then(|n| n.parse::<u8>().ok());

        match (para.style_id.as_deref(), heading_level) {
            (Some("Title"), _) if doc.title.is_none() && !text.is_empty() => {
                let rule_before = matches!(doc.blocks.as_slice(), [OutputBlock::Rule]);
                if rule_before {
                    doc.blocks.clear();
                }
                doc.title = Some(TitleBlock {
                    run: merged_run(&para.runs, text, style),
                    spacing_after: para.spacing_after,
                    rule_before,
                });
            }
            (_, Some(level)) if !text.is_empty() => {
                let run = merged_run(&para.runs, text, style);
                doc.blocks.push(OutputBlock::Heading(HeadingBlock {
                    level,
                    text: run.text,
                    font_family: run.font_family,
                    font_size: run.font_size,
                    spacing_before: para.spacing_before,
                    spacing_after: para.spacing_after,
                }));
            }
            _ if text.is_empty() => {
                if !doc.blocks.last().is_some_and(OutputBlock::is_empty_block) {
                    doc.blocks.push(OutputBlock::Empty);
                }
            }
            _ => doc.blocks.push(OutputBlock::Paragraph(Paragraph {
                alignment: para.alignment,
                spacing_before: para.spacing_before,
                spacing_after: para.spacing_after,
                runs: para.runs.into_iter().filter(|r| !r.text.is_empty()).collect(),
            })),
        }
    }

    let is_trailer = match (doc.blocks.last(), &style.trailer_text) {
        (Some(OutputBlock::Paragraph(p)), Some(trailer)) => p.text().trim() == trailer.trim(),
        _ => false,
    };
    if is_trailer {
        if let Some(OutputBlock::Paragraph(p)) = doc.blocks.pop() {
            doc.trailer = Some(p);
        }
    }

    debug!(
        "Read .docx with {} blocks (title: {})",
        doc.blocks.len(),
        doc.title.is_some()
    );
    Ok(doc)
}

/// A part of the package as text, or `None` when the package lacks it.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>, String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(format!("{name}: {e}")),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| format!("{name}: {e}"))?;
    Ok(Some(xml))
}

/// The first run's formatting carrying `text`.
fn merged_run(runs: &[Run], text: &str, style: &StyleSheet) -> Run {
    match runs.iter().find(|r| !r.text.trim().is_empty()) {
        Some(first) => Run {
            text: text.to_string(),
            ..first.clone()
        },
        None => Run::body(text, style),
    }
}

fn footer_run(paragraphs: &[DocxParagraph], style: &StyleSheet) -> Run {
    let text: Vec<String> = paragraphs
        .iter()
        .map(|p| p.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let runs: Vec<Run> = paragraphs.iter().flat_map(|p| p.runs.iter().cloned()).collect();
    merged_run(&runs, &text.join(" "), style)
}

// ── WordprocessingML walking ─────────────────────────────────────────────────

/// One `<w:p>` as found in the XML.
#[derive(Debug, Clone, Default)]
struct DocxParagraph {
    style_id: Option<String>,
    alignment: Alignment,
    border: bool,
    /// Points.
    spacing_before: f32,
    /// Points.
    spacing_after: f32,
    runs: Vec<Run>,
}

impl DocxParagraph {
    fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Every paragraph of a WordprocessingML part, in order.
fn read_paragraphs(xml: &str, style: &StyleSheet) -> Result<Vec<DocxParagraph>, String> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut para: Option<DocxParagraph> = None;
    let mut run: Option<Run> = None;
    let mut in_text = false;
    let mut in_run_props = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!("XML error at byte {}: {}", reader.buffer_position(), e)
        })?;
        match event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"p" => {
                    // Nested paragraphs (text boxes) close the outer one.
                    if let Some(outer) = para.take() {
                        paragraphs.push(outer);
                    }
                    para = Some(DocxParagraph::default());
                }
                b"r" => run = Some(Run::body("", style)),
                b"rPr" => in_run_props = true,
                b"t" => in_text = true,
                name => apply_property(name, &e, para.as_mut(), run.as_mut().filter(|_| in_run_props)),
            },
            Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"p" => paragraphs.push(DocxParagraph::default()),
                // `<w:tab/>` also appears as a tab stop in paragraph properties.
                b"tab" => {
                    if let Some(run) = run.as_mut() {
                        run.text.push('\t');
                    }
                }
                b"br" | b"cr" => {
                    if let Some(run) = run.as_mut() {
                        run.text.push('\n');
                    }
                }
                name => apply_property(name, &e, para.as_mut(), run.as_mut().filter(|_| in_run_props)),
            },
            Event::Text(e) => {
                if let (true, Some(run)) = (in_text, run.as_mut()) {
                    run.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if let (true, Some(run)) = (in_text, run.as_mut()) {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(c) = resolve_entity(&entity) {
                        run.text.push(c);
                    }
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"rPr" => in_run_props = false,
                b"r" => {
                    if let (Some(done), Some(para)) = (run.take(), para.as_mut()) {
                        para.runs.push(done);
                    }
                }
                b"p" => {
                    if let Some(done) = para.take() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Apply one paragraph or run property element.
fn apply_property(
    name: &[u8],
    e: &BytesStart<'_>,
    para: Option<&mut DocxParagraph>,
    run: Option<&mut Run>,
) {
    if let Some(run) = run {
        match name {
            b"b" => run.bold = toggled_on(e),
            b"i" => run.italic = toggled_on(e),
            b"u" => run.underline = toggled_on(e),
            b"color" => {
                if let Some(color) = attribute(e, b"val").as_deref().and_then(Rgb::from_hex) {
                    run.color = color;
                }
            }
            b"sz" => {
                if let Some(half_points) = attribute(e, b"val").and_then(|v| v.parse::<f32>().ok()) {
                    run.font_size = half_points / 2.0;
                }
            }
            b"rFonts" => {
                if let Some(font) = attribute(e, b"ascii") {
                    run.font_family = font;
                }
            }
            _ => {}
        }
        return;
    }

    let Some(para) = para else {
        return;
    };
    match name {
        b"pStyle" => para.style_id = attribute(e, b"val"),
        b"jc" => {
            para.alignment = match attribute(e, b"val").as_deref() {
                Some("center") => Alignment::Center,
                Some("right") | Some("end") => Alignment::Right,
                Some("both") | Some("distribute") => Alignment::Justify,
                _ => Alignment::Left,
            }
        }
        b"pBdr" => para.border = true,
        b"spacing" => {
            let points = |key: &[u8]| {
                attribute(e, key)
                    .and_then(|v| v.parse::<f32>().ok())
                    .map(|twentieths| twentieths / 20.0)
            };
            if let Some(before) = points(b"before") {
                para.spacing_before = before;
            }
            if let Some(after) = points(b"after") {
                para.spacing_after = after;
            }
        }
        _ => {}
    }
}

/// On/off properties such as `<w:b/>` are on unless `w:val` turns them off.
fn toggled_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        attribute(e, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

/// Value of the attribute whose local name is `key`.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Predefined XML entities and numeric character references.
fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "apos" => Some('\''),
        "quot" => Some('"'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(InputKind::from_path(Path::new("a.TXT")), Some(InputKind::Text));
        assert_eq!(InputKind::from_path(Path::new("a.md")), Some(InputKind::Text));
        assert_eq!(InputKind::from_path(Path::new("a.docx")), Some(InputKind::Docx));
        assert_eq!(InputKind::from_path(Path::new("a.pdf")), None);
        assert_eq!(InputKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t xml:space="preserve">Billy: Welcome </w:t></w:r><w:r><w:t>to the show</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>Don&apos;t stop&#8230;</w:t><w:tab/><w:t>A &amp; B</w:t></w:r></w:p>
</w:body></w:document>"#;
        let text = extract_docx_text(&docx_with(xml)).unwrap();
        assert_eq!(text, "Billy: Welcome to the show\n\nDon't stop…\tA & B");
    }

    #[test]
    fn docx_without_document_part_is_rejected() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        let err = extract_docx_text(&buf.into_inner()).unwrap_err();
        assert!(err.contains("word/document.xml"), "{err}");
    }

    #[test]
    fn not_a_zip_is_rejected() {
        assert!(extract_docx_text(b"plain text, not a zip").is_err());
    }

    #[test]
    fn rendered_docx_reads_back_with_the_same_preview() {
        use crate::export::{DocumentSerializer, DocxSerializer, TextPreviewSerializer};
        use crate::pipeline::render::render_markup;

        let style = StyleSheet::default();
        let markup = "──────────\n**Living in the Last Days**\n\n**Billy:** Read **John 3:16** today.\n\n**1. Discernment**\n*Be alert* and pray.\n──────────\n♪ *Give me Jesus* ♪\n♪ ♪";
        let rendered = render_markup(markup, "", &style).document;
        let bytes = DocxSerializer.serialize(&rendered).unwrap();

        let read = read_docx_document(&bytes, &style).unwrap();
        let title = read.title.as_ref().unwrap();
        assert_eq!(title.text(), "Living in the Last Days");
        assert!(title.rule_before && title.run.bold && title.run.underline);
        assert!(read.blocks.iter().any(OutputBlock::is_rule));
        assert_eq!(read.footer.text, style.footer_text);
        assert!(read.trailer.is_some());

        let preview = TextPreviewSerializer.preview(&read);
        assert!(preview.contains("[CENTER] **Living in the Last Days**"), "{preview}");
        assert!(preview.contains("**Billy:** Read **John 3:16** today."), "{preview}");
        assert!(preview.contains("[H1] 1. Discernment"), "{preview}");
        assert_eq!(preview, TextPreviewSerializer.preview(&rendered));
    }

    #[test]
    fn foreign_docx_paragraph_properties() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b w:val="0"/><w:i/><w:color w:val="C00000"/><w:sz w:val="28"/></w:rPr><w:t>Heard</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Part Two</w:t></w:r></w:p>
</w:body></w:document>"#;
        let style = StyleSheet::default();
        let doc = read_docx_document(&docx_with(xml), &style).unwrap();
        assert!(doc.title.is_none());
        assert!(doc.footer.text.is_empty());

        let OutputBlock::Paragraph(p) = &doc.blocks[0] else {
            panic!("expected paragraph, got {:?}", doc.blocks[0]);
        };
        assert_eq!(p.alignment, Alignment::Center);
        assert_eq!(p.text(), "Heard");
        let run = &p.runs[0];
        assert!(!run.bold && run.italic);
        assert_eq!(run.color, Rgb(0xC0, 0, 0));
        assert_eq!(run.font_size, 14.0);

        let OutputBlock::Heading(h) = &doc.blocks[1] else {
            panic!("expected heading, got {:?}", doc.blocks[1]);
        };
        assert_eq!((h.level, h.text.as_str()), (2, "Part Two"));
    }

    #[tokio::test]
    async fn load_docx_document_needs_a_docx_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "text").unwrap();
        assert!(matches!(
            load_docx_document(&path, &StyleSheet::default()).await,
            Err(TranscriptError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn entities() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#x266A"), Some('♪'));
        assert_eq!(resolve_entity("#39"), Some('\''));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[tokio::test]
    async fn load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("living_in_the-last-days.txt");
        std::fs::write(&path, "Hello\nworld").unwrap();
        let loaded = load_input(&path).await.unwrap();
        assert_eq!(loaded.kind, InputKind::Text);
        assert_eq!(loaded.text, "Hello\nworld");
        assert_eq!(loaded.title_hint().as_deref(), Some("living in the last days"));
    }

    #[tokio::test]
    async fn load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            load_input(&missing).await,
            Err(TranscriptError::FileNotFound { .. })
        ));

        let pdf = dir.path().join("talk.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();
        assert!(matches!(
            load_input(&pdf).await,
            Err(TranscriptError::UnsupportedInput { .. })
        ));

        let latin1 = dir.path().join("latin1.txt");
        std::fs::write(&latin1, [0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert!(matches!(
            load_input(&latin1).await,
            Err(TranscriptError::InvalidEncoding { .. })
        ));

        let bad_docx = dir.path().join("bad.docx");
        std::fs::write(&bad_docx, b"nope").unwrap();
        assert!(matches!(
            load_input(&bad_docx).await,
            Err(TranscriptError::InvalidDocx { .. })
        ));
    }
}
