//! The format-agnostic rendered document.
//!
//! [`OutputDocument`] is what the renderer produces and what every
//! [`crate::export::DocumentSerializer`] consumes. It knows about paragraphs,
//! runs, fonts and colors, but nothing about any concrete file format.
//! Every field is always populated, so a serializer never has to guess a
//! default.

use crate::style::{Margins, Rgb, StyleSheet};
use serde::{Deserialize, Serialize};

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A contiguous piece of text with uniform character formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Rgb,
    pub font_family: String,
    /// Font size in points.
    pub font_size: f32,
}

impl Run {
    /// A run in the body font with no emphasis.
    pub fn body(text: impl Into<String>, style: &StyleSheet) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            underline: false,
            color: style.text_color,
            font_family: style.body_font.clone(),
            font_size: style.body_size,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn size(mut self, points: f32) -> Self {
        self.font_size = points;
        self
    }

    pub fn font(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub alignment: Alignment,
    /// Points.
    pub spacing_before: f32,
    /// Points.
    pub spacing_after: f32,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(alignment: Alignment, spacing_after: f32, runs: Vec<Run>) -> Self {
        Self {
            alignment,
            spacing_before: 0.0,
            spacing_after,
            runs,
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    pub level: u8,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub spacing_before: f32,
    pub spacing_after: f32,
}

/// One body block, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputBlock {
    Paragraph(Paragraph),
    Heading(HeadingBlock),
    /// Horizontal divider rule.
    Rule,
    /// Vertical spacing only.
    Empty,
}

impl OutputBlock {
    pub fn is_rule(&self) -> bool {
        matches!(self, OutputBlock::Rule)
    }

    pub fn is_empty_block(&self) -> bool {
        matches!(self, OutputBlock::Empty)
    }
}

/// The document title, rendered centered above the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub run: Run,
    pub spacing_after: f32,
    /// A divider line sat directly above the title in the source markup.
    pub rule_before: bool,
}

impl TitleBlock {
    pub fn text(&self) -> &str {
        &self.run.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub margins: Margins,
}

/// The renderer's fully materialised result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub page: PageSetup,
    pub title: Option<TitleBlock>,
    pub blocks: Vec<OutputBlock>,
    /// Repeated centered on every page.
    pub footer: Run,
    /// Appended after the last body block.
    pub trailer: Option<Paragraph>,
}

impl OutputDocument {
    /// An empty document carrying only page-level metadata from `style`.
    pub fn new(style: &StyleSheet) -> Self {
        let footer = Run::body(style.footer_text.clone(), style)
            .size(style.footer_size)
            .color(style.footer_color);
        let trailer = style.trailer_text.as_ref().map(|text| {
            let run = Run::body(text.clone(), style)
                .italic()
                .size(style.trailer_size)
                .color(style.trailer_color);
            Paragraph {
                alignment: Alignment::Center,
                spacing_before: style.heading_spacing_before,
                spacing_after: 0.0,
                runs: vec![run],
            }
        });
        Self {
            page: PageSetup {
                margins: style.margins,
            },
            title: None,
            blocks: Vec::new(),
            footer,
            trailer,
        }
    }

    /// Number of paragraph and heading blocks.
    pub fn content_blocks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, OutputBlock::Paragraph(_) | OutputBlock::Heading(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_metadata_only() {
        let style = StyleSheet::default();
        let doc = OutputDocument::new(&style);
        assert!(doc.blocks.is_empty());
        assert!(doc.title.is_none());
        assert_eq!(doc.page.margins, Margins::uniform(1.0));
        assert_eq!(doc.footer.text, style.footer_text);
        assert!(doc.trailer.as_ref().is_some_and(|p| p.runs[0].italic));
    }

    #[test]
    fn trailer_can_be_disabled() {
        let style = StyleSheet {
            trailer_text: None,
            ..StyleSheet::default()
        };
        assert!(OutputDocument::new(&style).trailer.is_none());
    }

    #[test]
    fn block_serialises_with_kind_tag() {
        let json = serde_json::to_string(&OutputBlock::Rule).unwrap();
        assert_eq!(json, r#"{"kind":"rule"}"#);
    }
}
