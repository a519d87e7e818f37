//! # transcript-docx
//!
//! Turn raw speech transcripts into styled Word documents.
//!
//! A language model is asked to add light markup to the transcript (a bold
//! title, bold `Speaker:` labels, bold Scripture references, italic lyrics,
//! numbered section headers, divider lines). This crate then cleans the
//! model's answer and renders it deterministically: every line is classified,
//! split into styled runs, and emitted as paragraphs, headings and rules in
//! an [`OutputDocument`], which the [`export`] serializers write as `.docx`,
//! JSON or a plain-text preview.
//!
//! ## Pipeline Overview
//!
//! ```text
//! transcript (.txt / .md / .docx)
//!  │
//!  ├─ 1. Input    read text, or paragraph text out of word/document.xml
//!  ├─ 2. Format   LLM call with timeout + retry (skipped with `preformatted`)
//!  ├─ 3. Cleanup  fences, mojibake, stray ellipses, blank-line runs
//!  ├─ 4. Scan     classify lines, split inline spans
//!  ├─ 5. Render   OutputDocument (title, blocks, footer, trailer)
//!  └─ 6. Export   DOCX / JSON / text preview
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use transcript_docx::{format_to_file, FormatConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from ANTHROPIC_API_KEY / OPENAI_API_KEY / …
//!     let config = FormatConfig::default();
//!     let output = format_to_file("sermon.txt", "sermon.docx", None, &config).await?;
//!     eprintln!("{} blocks, {} warnings", output.stats.content_blocks, output.stats.warnings);
//!     Ok(())
//! }
//! ```
//!
//! Already-marked-up text needs no provider at all:
//!
//! ```rust
//! use transcript_docx::{build_document, FormatConfig};
//!
//! let out = build_document("**Last Days**\n\n**Billy:** Read **John 3:16**.", "x", &FormatConfig::default()).unwrap();
//! assert_eq!(out.document.title.unwrap().text(), "Last Days");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `transcript2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod style;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FormatConfig, FormatConfigBuilder};
pub use convert::{
    build_document, format_file, format_sync, format_to_file, format_transcript,
    format_transcript_with, resolve_provider, write_document,
};
pub use document::{
    Alignment, HeadingBlock, OutputBlock, OutputDocument, Paragraph, Run, TitleBlock,
};
pub use error::{MarkupWarning, TranscriptError};
pub use export::{DocumentSerializer, OutputFormat};
pub use output::{FormatOutput, FormatStats};
pub use pipeline::llm::{FormatResponse, LlmFormatter, TranscriptFormatter};
pub use pipeline::render::{render_markup, Rendered, Renderer};
pub use progress::{FormatProgressCallback, NoopProgressCallback, ProgressCallback};
pub use style::StyleSheet;
