//! LLM interaction: send the raw transcript with the style prompt and get
//! formatted markup back.
//!
//! The rest of the pipeline only sees the [`TranscriptFormatter`] trait, so
//! tests (and callers with their own model gateway) can plug in any
//! implementation. [`LlmFormatter`] is the production one, backed by an
//! `edgequake-llm` provider.
//!
//! ## Retry Strategy
//!
//! Overloaded (429/529) and gateway errors are transient. Exponential backoff
//! (`retry_backoff_ms * 2^(attempt-1)`) with a 500 ms base and 3 retries
//! waits 500 ms → 1 s → 2 s. Every attempt runs under its own
//! `tokio::time::timeout`; a timed-out attempt counts as a failed one.
//! Nothing is rendered until an attempt succeeds, so a failure never leaves
//! a partial document behind.

use crate::config::FormatConfig;
use crate::error::TranscriptError;
use crate::prompts::user_message;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Formatted markup plus usage accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatResponse {
    pub markup: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// The upstream collaborator: raw transcript + style prompt → markup.
pub trait TranscriptFormatter: Send + Sync {
    fn format<'a>(
        &'a self,
        raw: &'a str,
        style_prompt: &'a str,
    ) -> BoxFuture<'a, Result<FormatResponse, TranscriptError>>;
}

/// [`TranscriptFormatter`] over an `edgequake-llm` chat provider.
pub struct LlmFormatter {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmFormatter {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &FormatConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl TranscriptFormatter for LlmFormatter {
    fn format<'a>(
        &'a self,
        raw: &'a str,
        style_prompt: &'a str,
    ) -> BoxFuture<'a, Result<FormatResponse, TranscriptError>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(style_prompt),
                ChatMessage::user(user_message(raw)),
            ];
            let options = self.options();
            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| TranscriptError::LlmApiError {
                    message: e.to_string(),
                })?;
            Ok(FormatResponse {
                markup: response.content,
                input_tokens: response.prompt_tokens as u64,
                output_tokens: response.completion_tokens as u64,
            })
        })
    }
}

/// Outcome of [`format_with_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub response: FormatResponse,
    /// 1-indexed attempt that succeeded.
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Call `formatter` until it returns non-empty markup or the retry budget is
/// spent.
///
/// # Errors
/// [`TranscriptError::FormattingFailed`] carrying the last attempt's error.
pub async fn format_with_retry(
    formatter: &dyn TranscriptFormatter,
    raw: &str,
    config: &FormatConfig,
) -> Result<Formatted, TranscriptError> {
    let start = Instant::now();
    let prompt = config.effective_prompt();
    let max_attempts = config.max_attempts();
    let per_call = Duration::from_secs(config.api_timeout_secs);
    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "Retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_attempt_start(attempt + 1, max_attempts);
        }

        let err_msg = match timeout(per_call, formatter.format(raw, prompt)).await {
            Ok(Ok(response)) if !response.markup.trim().is_empty() => {
                let duration = start.elapsed();
                debug!(
                    "Formatted in {} attempt(s): {} input tokens, {} output tokens, {:?}",
                    attempt + 1,
                    response.input_tokens,
                    response.output_tokens,
                    duration
                );
                return Ok(Formatted {
                    response,
                    attempts: attempt + 1,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Ok(Ok(_)) => "LLM returned an empty response".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => TranscriptError::ApiTimeout {
                secs: config.api_timeout_secs,
            }
            .to_string(),
        };

        warn!("Attempt {} failed: {}", attempt + 1, err_msg);
        if let Some(ref cb) = config.progress_callback {
            cb.on_attempt_failed(attempt + 1, &err_msg);
        }
        last_err = Some(err_msg);
    }

    Err(TranscriptError::FormattingFailed {
        attempts: max_attempts,
        last_error: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
