//! Formatting entry points.
//!
//! ```text
//! load_input ──▶ repair_encoding ──▶ TranscriptFormatter ──▶ clean ──▶ render ──▶ serialize
//!   (.txt/.docx)                        (LLM, with retry)
//! ```
//!
//! [`build_document`] is the pure core (cleanup + scan + render) and never
//! touches the network. [`format_transcript`] adds the LLM call,
//! [`format_file`] adds input loading, and [`format_to_file`] adds an atomic
//! write of the serialized document.

use crate::config::FormatConfig;
use crate::error::TranscriptError;
use crate::export::OutputFormat;
use crate::output::{FormatOutput, FormatStats};
use crate::pipeline::cleanup::{clean_with, repair_encoding, CleanupOptions};
use crate::pipeline::input::load_input;
use crate::pipeline::llm::{format_with_retry, LlmFormatter, TranscriptFormatter};
use crate::pipeline::render::Renderer;
use crate::prompts::STYLE_PROMPT_VERSION;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Title used when neither the markup nor the caller supplies one.
pub const DEFAULT_TITLE: &str = "Transcript";

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

/// Clean and render already-formatted markup. No I/O.
///
/// # Errors
/// [`TranscriptError::EmptyInput`] when nothing is left after cleanup.
pub fn build_document(
    markup: &str,
    fallback_title: &str,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    let start = Instant::now();
    let cleaned = clean_with(
        markup,
        CleanupOptions {
            stutter: config.stutter_cleanup,
        },
    );
    if cleaned.trim().is_empty() {
        return Err(TranscriptError::EmptyInput);
    }

    let rendered = Renderer::new(&config.style).render_markup(&cleaned, fallback_title);
    for warning in &rendered.warnings {
        debug!("{}", warning);
    }

    let stats = FormatStats {
        input_chars: markup.chars().count(),
        markup_chars: cleaned.chars().count(),
        content_blocks: rendered.document.content_blocks(),
        warnings: rendered.warnings.len(),
        render_duration_ms: start.elapsed().as_millis() as u64,
        prompt_version: prompt_version(config),
        ..FormatStats::default()
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_format_complete(rendered.document.blocks.len(), rendered.warnings.len());
    }

    Ok(FormatOutput {
        markup: cleaned,
        document: rendered.document,
        warnings: rendered.warnings,
        stats,
    })
}

/// Format a raw transcript: LLM call (unless `config.preformatted`), then
/// [`build_document`].
///
/// The provider is resolved from `config`; see [`resolve_provider`].
pub async fn format_transcript(
    raw: &str,
    fallback_title: &str,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    if config.preformatted {
        return format_transcript_with(None, raw, fallback_title, config).await;
    }
    let provider = resolve_provider(config)?;
    let formatter = LlmFormatter::new(provider, config);
    format_transcript_with(Some(&formatter as &dyn TranscriptFormatter), raw, fallback_title, config)
        .await
}

/// [`format_transcript`] with an explicit formatter. `None` treats the input
/// as markup already.
pub async fn format_transcript_with(
    formatter: Option<&dyn TranscriptFormatter>,
    raw: &str,
    fallback_title: &str,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    let total_start = Instant::now();
    let repaired = repair_encoding(raw);
    if repaired.trim().is_empty() {
        return Err(TranscriptError::EmptyInput);
    }
    let input_chars = repaired.chars().count();
    info!("Formatting transcript ({} chars)", input_chars);
    if let Some(ref cb) = config.progress_callback {
        cb.on_format_start(input_chars);
    }

    let (markup, attempts, input_tokens, output_tokens, llm_duration_ms) = match formatter {
        Some(formatter) => {
            let formatted = format_with_retry(formatter, &repaired, config).await?;
            (
                formatted.response.markup,
                formatted.attempts,
                formatted.response.input_tokens,
                formatted.response.output_tokens,
                formatted.duration_ms,
            )
        }
        None => (repaired, 0, 0, 0, 0),
    };
    if let Some(ref cb) = config.progress_callback {
        cb.on_formatted(markup.len());
    }

    let mut output = build_document(&markup, fallback_title, config)?;
    output.stats.input_chars = input_chars;
    output.stats.attempts = attempts;
    output.stats.input_tokens = input_tokens;
    output.stats.output_tokens = output_tokens;
    output.stats.llm_duration_ms = llm_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Formatting complete: {} blocks, {} warnings, {}ms",
        output.stats.content_blocks, output.stats.warnings, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Load a `.txt`/`.md`/`.docx` transcript and format it.
///
/// The fallback title is `config.fallback_title`, else the file name.
pub async fn format_file(
    input: impl AsRef<Path>,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    let loaded = load_input(input).await?;
    let title = config
        .fallback_title
        .clone()
        .or_else(|| loaded.title_hint())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    format_transcript(&loaded.text, &title, config).await
}

/// Format a transcript file and write the serialized document to `output_path`.
///
/// The format is `format`, else guessed from the output extension, else DOCX.
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn format_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    format: Option<OutputFormat>,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    let output = format_file(input, config).await?;
    let path = output_path.as_ref();
    let format = format
        .or_else(|| OutputFormat::from_path(path))
        .unwrap_or_default();
    write_document(&output, path, format)?;
    Ok(output)
}

/// Serialize `output.document` and write it atomically to `path`.
pub fn write_document(
    output: &FormatOutput,
    path: &Path,
    format: OutputFormat,
) -> Result<(), TranscriptError> {
    let bytes = format.serializer().serialize(&output.document)?;
    let write_err = |source: std::io::Error| TranscriptError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} ({} bytes, {})", path.display(), bytes.len(), format);
    Ok(())
}

/// Synchronous wrapper around [`format_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn format_sync(
    input: impl AsRef<Path>,
    config: &FormatConfig,
) -> Result<FormatOutput, TranscriptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranscriptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(format_file(input, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn prompt_version(config: &FormatConfig) -> String {
    if config.system_prompt.is_some() {
        "custom".to_string()
    } else {
        STYLE_PROMPT_VERSION.to_string()
    }
}

fn default_model(provider_name: &str) -> &'static str {
    match provider_name {
        "anthropic" | "claude" => DEFAULT_ANTHROPIC_MODEL,
        _ => DEFAULT_OPENAI_MODEL,
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TranscriptError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TranscriptError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or that
///    provider's default model.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Anthropic** when `ANTHROPIC_API_KEY` is set.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &FormatConfig) -> Result<Arc<dyn LLMProvider>, TranscriptError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or_else(|| default_model(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
        return create_provider("anthropic", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TranscriptError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarkupWarning;
    use crate::pipeline::llm::FormatResponse;
    use futures::future::BoxFuture;

    struct FixedFormatter(&'static str);

    impl TranscriptFormatter for FixedFormatter {
        fn format<'a>(
            &'a self,
            _raw: &'a str,
            _style_prompt: &'a str,
        ) -> BoxFuture<'a, Result<FormatResponse, TranscriptError>> {
            Box::pin(async move {
                Ok(FormatResponse {
                    markup: self.0.to_string(),
                    input_tokens: 100,
                    output_tokens: 80,
                })
            })
        }
    }

    fn preformatted() -> FormatConfig {
        FormatConfig::builder().preformatted(true).build().unwrap()
    }

    #[test]
    fn build_document_rejects_empty() {
        let err = build_document(" ... \n\n \u{200B} \n", "T", &FormatConfig::default()).unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyInput));
    }

    #[test]
    fn build_document_cleans_then_renders() {
        let out = build_document(
            "```markdown\n**Living in the Last Days**\n\nIâ€™m glad  you're here.\n```",
            "Fallback",
            &FormatConfig::default(),
        )
        .unwrap();
        assert_eq!(out.document.title.as_ref().unwrap().text(), "Living in the Last Days");
        assert_eq!(out.markup, "**Living in the Last Days**\n\nI'm glad you're here.");
        assert_eq!(out.stats.content_blocks, 1);
        assert_eq!(out.stats.prompt_version, STYLE_PROMPT_VERSION);
    }

    #[tokio::test]
    async fn formatter_output_is_rendered() {
        let formatter = FixedFormatter("**Title**\n\n**Announcer:** This has been *World Impact*.");
        let out = format_transcript_with(Some(&formatter as &dyn TranscriptFormatter), "raw words", "x", &FormatConfig::default())
            .await
            .unwrap();
        assert_eq!(out.stats.attempts, 1);
        assert_eq!(out.stats.input_tokens, 100);
        assert_eq!(out.stats.input_chars, "raw words".len());
        assert_eq!(out.document.content_blocks(), 1);
    }

    #[tokio::test]
    async fn preformatted_skips_llm() {
        let out = format_transcript("**T**\nstray * star", "x", &preformatted())
            .await
            .unwrap();
        assert_eq!(out.stats.attempts, 0);
        assert_eq!(out.warnings, vec![MarkupWarning::UnbalancedDelimiters { line: 2 }]);
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected_before_llm() {
        let formatter = FixedFormatter("should not be used");
        let err = format_transcript_with(Some(&formatter as &dyn TranscriptFormatter), "  \n ", "x", &FormatConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::EmptyInput));
    }

    #[tokio::test]
    async fn format_to_file_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("last_days.txt");
        std::fs::write(&input, "Welcome to the show.\n\n**Billy:** Thank you.").unwrap();

        let out_path = dir.path().join("nested").join("last_days.docx");
        let out = format_to_file(&input, &out_path, None, &preformatted())
            .await
            .unwrap();
        assert_eq!(out.document.title.as_ref().unwrap().text(), "last days");

        let bytes = std::fs::read(&out_path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        let leftovers = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1, "temp file left behind");
    }

    #[tokio::test]
    async fn format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("talk.md");
        std::fs::write(&input, "**Talk**\nBody").unwrap();
        let out_path = dir.path().join("talk.json");
        format_to_file(&input, &out_path, None, &preformatted()).await.unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&out_path).unwrap()).unwrap();
        assert_eq!(value["title"]["run"]["text"], "Talk");
    }

    #[test]
    fn default_model_per_provider() {
        assert_eq!(default_model("anthropic"), DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(default_model("openai"), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn format_sync_reports_missing_file() {
        let err = format_sync("/definitely/not/here.txt", &preformatted()).unwrap_err();
        assert!(matches!(err, TranscriptError::FileNotFound { .. }));
    }
}
