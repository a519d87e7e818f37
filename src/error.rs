//! Error types for the transcript-docx library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`TranscriptError`] is **fatal**: the document cannot be produced at all
//!   (empty transcript, unreadable input, LLM unavailable, write failure).
//!   Returned as `Err(TranscriptError)` from the top-level `format*` functions.
//!
//! * [`MarkupWarning`] is **non-fatal**: the model's markup was ugly but still
//!   well-formed (an unbalanced `*`, a second title candidate, a doubled
//!   divider). These are resolved deterministically by the classifier and
//!   renderer and reported alongside the document so callers can count them.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the transcript-docx library.
#[derive(Debug, Error)]
pub enum TranscriptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The transcript is empty or whitespace-only after cleanup.
    #[error("Transcript is empty after cleanup; nothing to format")]
    EmptyInput,

    /// Input file was not found at the given path.
    #[error("Transcript file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one we can read.
    #[error("Unsupported input '{path}': expected a .txt, .md or .docx transcript")]
    UnsupportedInput { path: PathBuf },

    /// A `.docx` input could not be unpacked or parsed.
    #[error("Invalid .docx input '{path}': {detail}")]
    InvalidDocx { path: PathBuf, detail: String },

    /// A text input is not valid UTF-8.
    #[error("Transcript '{path}' is not valid UTF-8")]
    InvalidEncoding { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// A single formatting call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s\nIncrease --api-timeout for long transcripts.")]
    ApiTimeout { secs: u64 },

    /// Every attempt failed; no markup is available to render.
    #[error("Formatting failed after {attempts} attempts.\nLast error: {last_error}")]
    FormattingFailed { attempts: u32, last_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A serializer could not encode the document.
    #[error("Failed to serialise document as {format}: {detail}")]
    Serialization { format: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal markup irregularity, resolved by a documented fallback rule.
///
/// `line` is the 1-indexed line number in the cleaned markup.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum MarkupWarning {
    /// An odd number of `*` / `**` delimiters; the leftovers stay literal.
    #[error("Line {line}: unbalanced emphasis delimiters kept as literal text")]
    UnbalancedDelimiters { line: usize },

    /// A bold-wrapped line qualified as a title after the title was taken.
    #[error("Line {line}: second title candidate treated as body text")]
    DemotedTitle { line: usize },

    /// A divider directly followed another divider.
    #[error("Line {line}: consecutive divider collapsed")]
    CollapsedDivider { line: usize },

    /// A divider at the very start or end of the body.
    #[error("Line {line}: divider at document boundary dropped")]
    DroppedBoundaryDivider { line: usize },
}

impl MarkupWarning {
    pub fn line(&self) -> usize {
        match self {
            MarkupWarning::UnbalancedDelimiters { line }
            | MarkupWarning::DemotedTitle { line }
            | MarkupWarning::CollapsedDivider { line }
            | MarkupWarning::DroppedBoundaryDivider { line } => *line,
        }
    }
}
