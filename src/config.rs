//! Configuration types for transcript formatting.
//!
//! All formatting behaviour is controlled through [`FormatConfig`], built via
//! its [`FormatConfigBuilder`]. One struct holds the LLM knobs, the cleanup
//! toggles and the [`StyleSheet`], so a config can be shared across tasks and
//! two runs can be compared field by field.

use crate::error::TranscriptError;
use crate::progress::ProgressCallback;
use crate::style::StyleSheet;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for formatting one or more transcripts.
///
/// Built via [`FormatConfig::builder()`] or using [`FormatConfig::default()`].
///
/// # Example
/// ```rust
/// use transcript_docx::FormatConfig;
///
/// let config = FormatConfig::builder()
///     .provider_name("anthropic")
///     .model("claude-sonnet-4-5-20250929")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FormatConfig {
    /// LLM model identifier. If None, a per-provider default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "anthropic", "openai", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Formatting should be faithful to the spoken words, so keep this low.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 16384.
    ///
    /// The formatted transcript is roughly as long as the input; an hour of
    /// speech is around 10 000 words. Too low a limit truncates the output.
    pub max_tokens: usize,

    /// Maximum retry attempts after a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call LLM timeout in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, [`crate::prompts::STYLE_PROMPT`] is used.
    pub system_prompt: Option<String>,

    /// Title used when the markup has no title line.
    /// If None, file-based entry points fall back to the input file stem.
    pub fallback_title: Option<String>,

    /// Enable the heuristic stutter-removal cleanup stage. Default: false.
    pub stutter_cleanup: bool,

    /// Treat the input as already-formatted markup and skip the LLM. Default: false.
    pub preformatted: bool,

    /// Fonts, colors and lookup tables used by the splitter and renderer.
    pub style: Arc<StyleSheet>,

    /// Receives pipeline events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 16384,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 300,
            system_prompt: None,
            fallback_title: None,
            stutter_cleanup: false,
            preformatted: false,
            style: Arc::new(StyleSheet::default()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FormatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("custom_prompt", &self.system_prompt.is_some())
            .field("fallback_title", &self.fallback_title)
            .field("stutter_cleanup", &self.stutter_cleanup)
            .field("preformatted", &self.preformatted)
            .finish()
    }
}

impl FormatConfig {
    /// Create a new builder for `FormatConfig`.
    pub fn builder() -> FormatConfigBuilder {
        FormatConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt that will actually be sent.
    pub fn effective_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::STYLE_PROMPT)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Builder for [`FormatConfig`].
#[derive(Debug)]
pub struct FormatConfigBuilder {
    config: FormatConfig,
}

impl FormatConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(10);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn fallback_title(mut self, title: impl Into<String>) -> Self {
        self.config.fallback_title = Some(title.into());
        self
    }

    pub fn stutter_cleanup(mut self, v: bool) -> Self {
        self.config.stutter_cleanup = v;
        self
    }

    pub fn preformatted(mut self, v: bool) -> Self {
        self.config.preformatted = v;
        self
    }

    pub fn style(mut self, style: StyleSheet) -> Self {
        self.config.style = Arc::new(style);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FormatConfig, TranscriptError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(TranscriptError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(TranscriptError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.system_prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(TranscriptError::InvalidConfig(
                "system prompt must not be empty".into(),
            ));
        }
        if c.style.body_size <= 0.0 || c.style.title_size <= 0.0 || c.style.heading_size <= 0.0 {
            return Err(TranscriptError::InvalidConfig(format!(
                "font sizes must be positive (body {}, title {}, heading {})",
                c.style.body_size, c.style.title_size, c.style.heading_size
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = FormatConfig::default();
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.max_attempts(), 4);
        assert!(!c.stutter_cleanup);
        assert!(!c.preformatted);
        assert_eq!(c.effective_prompt(), crate::prompts::STYLE_PROMPT);
    }

    #[test]
    fn setters_clamp() {
        let c = FormatConfig::builder()
            .temperature(9.0)
            .max_retries(99)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.max_retries, 10);
    }

    #[test]
    fn build_rejects_zero_tokens() {
        let err = FormatConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_zero_timeout() {
        assert!(FormatConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn build_rejects_blank_prompt() {
        assert!(FormatConfig::builder().system_prompt("  ").build().is_err());
    }

    #[test]
    fn custom_prompt_is_used() {
        let c = FormatConfig::builder().system_prompt("Be brief.").build().unwrap();
        assert_eq!(c.effective_prompt(), "Be brief.");
    }

    #[test]
    fn debug_hides_provider() {
        let dbg = format!("{:?}", FormatConfig::default());
        assert!(dbg.contains("FormatConfig"));
        assert!(dbg.contains("provider: None"));
    }
}
