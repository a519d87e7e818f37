//! Plain-text preview: one line per block, with formatting shown as markers.
//!
//! Bold runs print as `**text**`, italic runs as `*text*`, centered
//! paragraphs are prefixed with `[CENTER]`, headings with `[H1]`, and rules
//! print as a line of `─`. Useful for eyeballing a rendering in a terminal.

use super::{DocumentSerializer, OutputFormat};
use crate::document::{Alignment, OutputBlock, OutputDocument, Paragraph, Run};
use crate::error::TranscriptError;

const RULE: &str = "────────────────────────────────────────";

pub struct TextPreviewSerializer;

impl TextPreviewSerializer {
    /// The preview as a `String`.
    pub fn preview(&self, doc: &OutputDocument) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(doc.blocks.len() + 4);

        if let Some(title) = &doc.title {
            if title.rule_before {
                lines.push(RULE.to_string());
            }
            lines.push(format!("[CENTER] {}", marked(&title.run)));
            lines.push(String::new());
        }

        for block in &doc.blocks {
            lines.push(match block {
                OutputBlock::Paragraph(p) => paragraph_line(p),
                OutputBlock::Heading(h) => format!("[H{}] {}", h.level, h.text),
                OutputBlock::Rule => RULE.to_string(),
                OutputBlock::Empty => String::new(),
            });
        }

        if let Some(trailer) = &doc.trailer {
            lines.push(String::new());
            lines.push(paragraph_line(trailer));
        }
        if !doc.footer.text.is_empty() {
            lines.push(format!("[FOOTER] {}", doc.footer.text));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl DocumentSerializer for TextPreviewSerializer {
    fn serialize(&self, doc: &OutputDocument) -> Result<Vec<u8>, TranscriptError> {
        Ok(self.preview(doc).into_bytes())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Text
    }
}

fn paragraph_line(p: &Paragraph) -> String {
    let text: String = p.runs.iter().map(marked).collect();
    match p.alignment {
        Alignment::Center => format!("[CENTER] {text}"),
        _ => text,
    }
}

fn marked(run: &Run) -> String {
    let mut text = run.text.clone();
    if run.bold {
        text = format!("**{text}**");
    }
    if run.italic {
        text = format!("*{text}*");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::render::render_markup;
    use crate::style::StyleSheet;

    #[test]
    fn preview_shows_markers() {
        let style = StyleSheet {
            trailer_text: None,
            ..StyleSheet::default()
        };
        let markup = "**Living in the Last Days**\n\n**Billy:** Read **John 3:16**.\n\n**1. Discernment**\n──────────\n♪ ♪";
        let doc = render_markup(markup, "", &style).document;
        let preview = TextPreviewSerializer.preview(&doc);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines[0], "[CENTER] **Living in the Last Days**");
        assert_eq!(lines[2], "**Billy:** Read **John 3:16**.");
        assert_eq!(lines[4], "[H1] 1. Discernment");
        assert_eq!(lines[5], RULE);
        assert_eq!(lines[6], "[CENTER] ♪ ♪");
        assert!(lines[7].starts_with("[FOOTER] "));
    }

    #[test]
    fn empty_footer_is_not_printed() {
        let mut doc = render_markup("Body", "", &StyleSheet::default()).document;
        doc.footer.text.clear();
        let preview = TextPreviewSerializer.preview(&doc);
        assert!(!preview.contains("[FOOTER]"), "{preview}");
    }
}
