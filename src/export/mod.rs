//! Serializers: [`OutputDocument`] → file bytes.
//!
//! The renderer never knows which file format it is producing. Each
//! [`DocumentSerializer`] turns the same format-agnostic document into one
//! concrete encoding:
//!
//! | Format | Serializer | Extension |
//! |--------|------------|-----------|
//! | Word   | [`DocxSerializer`] | `.docx` |
//! | JSON   | [`JsonSerializer`] | `.json` |
//! | Text preview with `**bold**` / `*italic*` / `[CENTER]` markers | [`TextPreviewSerializer`] | `.txt` |

mod docx;
mod json;
mod text;

pub use docx::DocxSerializer;
pub use json::JsonSerializer;
pub use text::TextPreviewSerializer;

use crate::document::OutputDocument;
use crate::error::TranscriptError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Turns a rendered document into the bytes of one file format.
pub trait DocumentSerializer: Send + Sync {
    fn serialize(&self, doc: &OutputDocument) -> Result<Vec<u8>, TranscriptError>;

    fn format(&self) -> OutputFormat;
}

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Docx,
    Json,
    Text,
}

impl OutputFormat {
    /// Pick the format from an output path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(OutputFormat::Docx),
            "json" => Some(OutputFormat::Json),
            "txt" | "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }

    pub fn serializer(self) -> Box<dyn DocumentSerializer> {
        match self {
            OutputFormat::Docx => Box::new(DocxSerializer),
            OutputFormat::Json => Box::new(JsonSerializer),
            OutputFormat::Text => Box::new(TextPreviewSerializer),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" | "preview" => Ok(OutputFormat::Text),
            other => Err(TranscriptError::InvalidConfig(format!(
                "unknown output format '{other}' (expected docx, json or text)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.DOCX")), Some(OutputFormat::Docx));
        assert_eq!(OutputFormat::from_path(Path::new("out.json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path(Path::new("out.txt")), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_path(Path::new("out.rtf")), None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("Word".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!("preview".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn serializer_matches_format() {
        for f in [OutputFormat::Docx, OutputFormat::Json, OutputFormat::Text] {
            assert_eq!(f.serializer().format(), f);
        }
    }
}
