//! CLI binary for transcript-docx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `FormatConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use transcript_docx::export::TextPreviewSerializer;
use transcript_docx::pipeline::input::{load_docx_document, InputKind};
use transcript_docx::{
    format_file, write_document, FormatConfig, FormatOutput, FormatProgressCallback, OutputFormat,
    ProgressCallback, StyleSheet,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose message follows the pipeline
/// stage, with one log line per failed LLM attempt.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading transcript…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl FormatProgressCallback for CliProgressCallback {
    fn on_format_start(&self, input_chars: usize) {
        self.bar.set_prefix("Formatting");
        self.bar.set_message(format!("{input_chars} chars"));
    }

    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        if attempt > 1 {
            self.bar
                .set_message(format!("waiting for model (attempt {attempt}/{max_attempts})"));
        } else {
            self.bar.set_message("waiting for model…");
        }
    }

    fn on_attempt_failed(&self, attempt: u32, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Attempt {}  {}", red("✗"), attempt, red(&msg)));
    }

    fn on_formatted(&self, markup_len: usize) {
        self.bar.set_prefix("Rendering");
        self.bar.set_message(format!("{markup_len} chars of markup"));
    }

    fn on_format_complete(&self, blocks: usize, warnings: usize) {
        self.bar.finish_and_clear();
        if warnings == 0 {
            eprintln!("{} {} blocks rendered", green("✔"), bold(&blocks.to_string()));
        } else {
            eprintln!(
                "{} {} blocks rendered  ({} markup warnings)",
                cyan("⚠"),
                bold(&blocks.to_string()),
                warnings
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Format a transcript into sermon.docx (next to the input)
  transcript2docx sermon.txt

  # Choose the output file and title
  transcript2docx sermon.txt -o out/last-days.docx --title "Living in the Last Days"

  # Render markup you already have, no API key needed
  transcript2docx --preformatted marked-up.md -o marked-up.docx

  # Look at the rendering in the terminal
  transcript2docx --preformatted --preview marked-up.md

  # Word transcript in, JSON document model out
  transcript2docx interview.docx --format json -o interview.json

  # Show existing Word documents with formatting markers
  transcript2docx --display formatted/

  # Use a specific model
  transcript2docx --provider openai --model gpt-4.1 sermon.txt

MARKUP THE RENDERER UNDERSTANDS:
  **Title**                   first bold line near the top, centered
  **Speaker:** text           bold speaker label
  **John 3:16**               bold Scripture reference, colored
  **1. Section**              numbered section heading
  ♪ lyric line ♪              italic, colored
  *quote*                     italic; long quotes are colored
  ──────────                  divider rule (starts with 10+ of ─, ━, - or _)

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override the log filter (e.g. transcript_docx=debug)
"#;

/// Format raw speech transcripts into styled Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "transcript2docx",
    version,
    about = "Format raw speech transcripts into styled Word documents",
    long_about = "Send a raw transcript (.txt, .md or .docx) to a language model with \
formatting instructions, then render the marked-up answer into a styled .docx with title, \
speaker labels, Scripture references, lyrics, section headings and divider rules.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Transcript file (.txt, .md or .docx), or with --display a .docx file
    /// or a directory of them.
    input: PathBuf,

    /// Output file. Defaults to the input path with the format's extension.
    #[arg(short, long, env = "TRANSCRIPT2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Guessed from --output's extension when omitted.
    #[arg(long, env = "TRANSCRIPT2DOCX_FORMAT")]
    format: Option<OutputFormat>,

    /// Title used when the markup has none (default: input file name).
    #[arg(long, env = "TRANSCRIPT2DOCX_TITLE")]
    title: Option<String>,

    /// Input is already marked up; skip the LLM call.
    #[arg(long, env = "TRANSCRIPT2DOCX_PREFORMATTED")]
    preformatted: bool,

    /// Collapse false starts and repeated words ("the--the", "we, we").
    #[arg(long, env = "TRANSCRIPT2DOCX_STUTTER_CLEANUP")]
    stutter_cleanup: bool,

    /// LLM model ID (e.g. claude-sonnet-4-5-20250929, gpt-4.1-mini).
    #[arg(long, env = "TRANSCRIPT2DOCX_MODEL")]
    model: Option<String>,

    /// LLM provider: anthropic, openai, gemini, ollama, azure.
    #[arg(
        long,
        env = "TRANSCRIPT2DOCX_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: anthropic, openai, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Path to a text file containing a custom style prompt.
    #[arg(long, env = "TRANSCRIPT2DOCX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "TRANSCRIPT2DOCX_MAX_TOKENS", default_value_t = 16384)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "TRANSCRIPT2DOCX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "TRANSCRIPT2DOCX_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "TRANSCRIPT2DOCX_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// Print the run's FormatOutput as JSON on stdout.
    #[arg(long, env = "TRANSCRIPT2DOCX_JSON")]
    json: bool,

    /// Print a text preview of the document instead of writing a file.
    #[arg(long, env = "TRANSCRIPT2DOCX_PREVIEW")]
    preview: bool,

    /// Print existing .docx files with formatting markers instead of
    /// formatting the input. No LLM call is made.
    #[arg(long, env = "TRANSCRIPT2DOCX_DISPLAY")]
    display: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "TRANSCRIPT2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRANSCRIPT2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRANSCRIPT2DOCX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out
    // of its way unless asked for.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !cli.preview && !cli.display;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.display {
        return display(&cli.input).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn FormatProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = format_file(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to format {}", cli.input.display()))?;

    if cli.preview {
        let preview = TextPreviewSerializer.preview(&output.document);
        io::stdout()
            .lock()
            .write_all(preview.as_bytes())
            .context("Failed to write to stdout")?;
        if !cli.quiet {
            print_warnings(&output);
        }
        return Ok(());
    }

    let (output_path, format) = resolve_output(&cli);
    write_document(&output, &output_path, format)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        if cli.verbose || !show_progress {
            print_warnings(&output);
        }
        let stats = &output.stats;
        eprintln!(
            "{}  {} blocks  {}ms  →  {}",
            green("✔"),
            stats.content_blocks,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if stats.attempts > 0 {
            eprintln!(
                "   {} tokens in  /  {} tokens out  /  {} attempt(s)",
                dim(&stats.input_tokens.to_string()),
                dim(&stats.output_tokens.to_string()),
                stats.attempts,
            );
        }
    }

    Ok(())
}

/// Print one `.docx`, or every `.docx` in a directory, as a text preview.
async fn display(input: &Path) -> Result<()> {
    let style = StyleSheet::default();
    let files = if input.is_dir() {
        let files = docx_files_in(input).await?;
        if files.is_empty() {
            anyhow::bail!("No Word documents found in {}", input.display());
        }
        files
    } else {
        vec![input.to_path_buf()]
    };

    for path in &files {
        let doc = load_docx_document(path, &style)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if input.is_dir() {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            println!("\n{}", "=".repeat(60));
            println!("{}", bold(&format!("Document: {name}")));
            println!("{}", "=".repeat(60));
        }
        io::stdout()
            .lock()
            .write_all(TextPreviewSerializer.preview(&doc).as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

/// `.docx` files directly inside `dir`, sorted by path.
async fn docx_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && InputKind::from_path(&path) == Some(InputKind::Docx) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Map CLI args to `FormatConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<FormatConfig> {
    let mut builder = FormatConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .stutter_cleanup(cli.stutter_cleanup)
        .preformatted(cli.preformatted);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref title) = cli.title {
        builder = builder.fallback_title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Output path and format from `--output` / `--format`, defaulting to the
/// input path with the format's extension.
fn resolve_output(cli: &Cli) -> (PathBuf, OutputFormat) {
    match (&cli.output, cli.format) {
        (Some(path), Some(format)) => (path.clone(), format),
        (Some(path), None) => (
            path.clone(),
            OutputFormat::from_path(path).unwrap_or_default(),
        ),
        (None, format) => {
            let format = format.unwrap_or_default();
            (default_output_path(&cli.input, format), format)
        }
    }
}

fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let candidate = input.with_extension(format.extension());
    if candidate == input {
        // foo.txt with --format text would overwrite the input.
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "transcript".to_string());
        input.with_file_name(format!("{stem}.formatted.{}", format.extension()))
    } else {
        candidate
    }
}

fn print_warnings(output: &FormatOutput) {
    for warning in &output.warnings {
        eprintln!("  {} {}", cyan("⚠"), dim(&warning.to_string()));
    }
}
