use super::{DocumentSerializer, OutputFormat};
use crate::document::OutputDocument;
use crate::error::TranscriptError;

/// Pretty-printed JSON dump of the whole document model.
pub struct JsonSerializer;

impl DocumentSerializer for JsonSerializer {
    fn serialize(&self, doc: &OutputDocument) -> Result<Vec<u8>, TranscriptError> {
        serde_json::to_vec_pretty(doc).map_err(|e| TranscriptError::Serialization {
            format: "json".into(),
            detail: e.to_string(),
        })
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}
