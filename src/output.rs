//! Result types returned by the formatting entry points.

use crate::document::OutputDocument;
use crate::error::MarkupWarning;
use serde::{Deserialize, Serialize};

/// Everything produced for one transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOutput {
    /// Cleaned markup the document was rendered from.
    pub markup: String,
    pub document: OutputDocument,
    /// Non-fatal markup irregularities, sorted by line.
    pub warnings: Vec<MarkupWarning>,
    pub stats: FormatStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatStats {
    /// Characters in the raw transcript.
    pub input_chars: usize,
    /// Characters in the cleaned markup.
    pub markup_chars: usize,
    /// Paragraph and heading blocks in the body.
    pub content_blocks: usize,
    pub warnings: usize,
    /// LLM attempts used; 0 when the input was preformatted.
    pub attempts: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Revision of the built-in prompt, or `"custom"`.
    pub prompt_version: String,
}
