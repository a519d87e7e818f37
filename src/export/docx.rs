//! Word (`.docx`) writer.
//!
//! A `.docx` file is a zip package of WordprocessingML parts. We write the
//! minimum set Word and LibreOffice open without complaint:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml            title metadata
//! word/document.xml            title, body blocks, trailer, section setup
//! word/styles.xml              document defaults + Title/Heading1/Footer styles
//! word/footer1.xml             the repeating footer
//! word/_rels/document.xml.rels
//! ```
//!
//! Units: font sizes are half-points, spacing is twentieths of a point and
//! margins are twips (1/1440 inch).

use super::{DocumentSerializer, OutputFormat};
use crate::document::{Alignment, HeadingBlock, OutputBlock, OutputDocument, Paragraph, Run, TitleBlock};
use crate::error::TranscriptError;
use crate::style::Margins;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/></Relationships>"#;

/// US Letter, portrait, in twips.
const PAGE_WIDTH: u32 = 12240;
const PAGE_HEIGHT: u32 = 15840;

pub struct DocxSerializer;

impl DocumentSerializer for DocxSerializer {
    fn serialize(&self, doc: &OutputDocument) -> Result<Vec<u8>, TranscriptError> {
        write_package(doc).map_err(|e| TranscriptError::Serialization {
            format: "docx".into(),
            detail: e.to_string(),
        })
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }
}

fn write_package(doc: &OutputDocument) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("docProps/core.xml", core_xml(doc)),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        ("word/styles.xml", styles_xml()),
        ("word/footer1.xml", footer_xml(doc)),
        ("word/document.xml", document_xml(doc)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

// ── Parts ────────────────────────────────────────────────────────────────────

fn document_xml(doc: &OutputDocument) -> String {
    let mut xml = String::with_capacity(4096 + doc.blocks.len() * 256);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>"#
    ));

    if let Some(title) = &doc.title {
        write_title(&mut xml, title);
    }
    for block in &doc.blocks {
        match block {
            OutputBlock::Paragraph(p) => write_paragraph(&mut xml, p),
            OutputBlock::Heading(h) => write_heading(&mut xml, h),
            OutputBlock::Rule => write_rule(&mut xml),
            OutputBlock::Empty => xml.push_str("<w:p/>"),
        }
    }
    if let Some(trailer) = &doc.trailer {
        write_paragraph(&mut xml, trailer);
    }

    write_section(&mut xml, &doc.page.margins);
    xml.push_str("</w:body></w:document>");
    xml
}

fn styles_xml() -> String {
    format!(
        concat!(
            r#"{decl}<w:styles xmlns:w="{ns}">"#,
            r#"<w:docDefaults><w:pPrDefault><w:pPr><w:spacing w:after="0"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr></w:style>"#,
            r#"<w:style w:type="paragraph" w:styleId="Footer"><w:name w:val="footer"/><w:basedOn w:val="Normal"/></w:style>"#,
            r#"</w:styles>"#
        ),
        decl = XML_DECL,
        ns = W_NS,
    )
}

fn footer_xml(doc: &OutputDocument) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<w:ftr xmlns:w="{W_NS}" xmlns:r="{R_NS}">"#));
    xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Footer"/><w:jc w:val="center"/></w:pPr>"#);
    write_run(&mut xml, &doc.footer);
    xml.push_str("</w:p></w:ftr>");
    xml
}

fn core_xml(doc: &OutputDocument) -> String {
    let title = doc.title.as_ref().map(TitleBlock::text).unwrap_or_default();
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><dc:creator>{creator}</dc:creator>",
            "</cp:coreProperties>"
        ),
        decl = XML_DECL,
        title = escape(title),
        creator = env!("CARGO_PKG_NAME"),
    )
}

// ── Blocks ───────────────────────────────────────────────────────────────────

fn write_title(xml: &mut String, title: &TitleBlock) {
    if title.rule_before {
        write_rule(xml);
    }
    xml.push_str(&format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:spacing w:before="0" w:after="{}"/><w:jc w:val="center"/></w:pPr>"#,
        twentieths(title.spacing_after)
    ));
    write_run(xml, &title.run);
    xml.push_str("</w:p>");
}

fn write_heading(xml: &mut String, heading: &HeadingBlock) {
    let run = Run {
        text: heading.text.clone(),
        bold: true,
        italic: false,
        underline: false,
        color: crate::style::Rgb::BLACK,
        font_family: heading.font_family.clone(),
        font_size: heading.font_size,
    };
    let style = format!("Heading{}", heading.level.clamp(1, 9));
    xml.push_str(&format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/><w:spacing w:before="{}" w:after="{}"/></w:pPr>"#,
        twentieths(heading.spacing_before),
        twentieths(heading.spacing_after)
    ));
    write_run(xml, &run);
    xml.push_str("</w:p>");
}

fn write_paragraph(xml: &mut String, p: &Paragraph) {
    xml.push_str(&format!(
        r#"<w:p><w:pPr><w:spacing w:before="{}" w:after="{}"/><w:jc w:val="{}"/></w:pPr>"#,
        twentieths(p.spacing_before),
        twentieths(p.spacing_after),
        justification(p.alignment)
    ));
    for run in &p.runs {
        write_run(xml, run);
    }
    xml.push_str("</w:p>");
}

fn write_rule(xml: &mut String) {
    xml.push_str(
        r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr></w:pPr></w:p>"#,
    );
}

fn write_section(xml: &mut String, margins: &Margins) {
    xml.push_str(&format!(
        concat!(
            r#"<w:sectPr><w:footerReference w:type="default" r:id="rId2"/>"#,
            r#"<w:pgSz w:w="{}" w:h="{}"/>"#,
            r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/>"#,
            "</w:sectPr>"
        ),
        PAGE_WIDTH,
        PAGE_HEIGHT,
        twips(margins.top),
        twips(margins.right),
        twips(margins.bottom),
        twips(margins.left),
    ));
}

/// `<w:rPr>` children must follow the schema order: fonts, b, i, color, sz, u.
fn write_run(xml: &mut String, run: &Run) {
    let font = escape(run.font_family.as_str());
    let size = half_points(run.font_size);
    xml.push_str(&format!(
        r#"<w:r><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
    ));
    if run.bold {
        xml.push_str("<w:b/><w:bCs/>");
    }
    if run.italic {
        xml.push_str("<w:i/><w:iCs/>");
    }
    xml.push_str(&format!(
        r#"<w:color w:val="{}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
        run.color.to_hex()
    ));
    if run.underline {
        xml.push_str(r#"<w:u w:val="single"/>"#);
    }
    xml.push_str("</w:rPr>");
    write_text(xml, &run.text);
    xml.push_str("</w:r>");
}

/// Text with tabs and line breaks turned into their run-level elements.
fn write_text(xml: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                xml.push_str("<w:tab/>");
            }
            if !piece.is_empty() {
                xml.push_str(r#"<w:t xml:space="preserve">"#);
                xml.push_str(&escape(piece));
                xml.push_str("</w:t>");
            }
        }
    }
}

// ── Units ────────────────────────────────────────────────────────────────────

fn half_points(points: f32) -> u32 {
    (points * 2.0).round().max(1.0) as u32
}

fn twentieths(points: f32) -> u32 {
    (points * 20.0).round().max(0.0) as u32
}

fn twips(inches: f32) -> u32 {
    (inches * 1440.0).round().max(0.0) as u32
}

fn justification(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::extract_docx_text;
    use crate::pipeline::render::render_markup;
    use crate::style::StyleSheet;
    use std::io::Read;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    fn sample() -> OutputDocument {
        render_markup(
            "**Living in the Last Days**\n\n**Dr. Billy Wilson:** Read **John 3:16** & *rejoice*.\n──────────\n**1. A <Counterculture> Mindset**\n♪ Give me Jesus ♪",
            "",
            &StyleSheet::default(),
        )
        .document
    }

    #[test]
    fn package_has_all_parts() {
        let bytes = DocxSerializer.serialize(&sample()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/footer1.xml",
            "word/document.xml",
        ] {
            assert!(names.contains(&expected), "missing {expected}: {names:?}");
        }
    }

    #[test]
    fn document_xml_carries_styles() {
        let bytes = DocxSerializer.serialize(&sample()).unwrap();
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains("Living in the Last Days"));
        assert!(xml.contains(r#"<w:color w:val="0563C1"/>"#), "scripture color");
        assert!(xml.contains("&amp; "), "ampersand escaped");
        assert!(xml.contains("1. A &lt;Counterculture&gt; Mindset"));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains("<w:pBdr>"), "divider rule");
        assert!(xml.contains(r#"w:top="1440""#), "1-inch margins");
        assert!(xml.contains(r#"<w:sz w:val="40"/>"#), "20pt title");
    }

    #[test]
    fn footer_part_has_attribution() {
        let doc = sample();
        let bytes = DocxSerializer.serialize(&doc).unwrap();
        let footer = part(&bytes, "word/footer1.xml");
        assert!(footer.contains(&doc.footer.text));
        assert!(footer.contains(r#"<w:jc w:val="center"/>"#));
    }

    #[test]
    fn text_survives_docx_round_trip() {
        let bytes = DocxSerializer.serialize(&sample()).unwrap();
        let text = extract_docx_text(&bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Living in the Last Days");
        assert_eq!(lines[1], "Dr. Billy Wilson: Read John 3:16 & rejoice.");
        assert!(lines.contains(&"1. A <Counterculture> Mindset"));
        assert!(lines.contains(&"♪ Give me Jesus"));
    }

    #[test]
    fn tabs_and_breaks_become_elements() {
        let mut xml = String::new();
        write_text(&mut xml, "a\tb\nc");
        assert_eq!(
            xml,
            r#"<w:t xml:space="preserve">a</w:t><w:tab/><w:t xml:space="preserve">b</w:t><w:br/><w:t xml:space="preserve">c</w:t>"#
        );
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(half_points(11.0), 22);
        assert_eq!(twentieths(6.0), 120);
        assert_eq!(twips(1.0), 1440);
    }
}
