//! Cleanup: deterministic repair of LLM-formatted transcript markup.
//!
//! ## Why is cleanup necessary?
//!
//! Transcripts arrive from caption exporters that routinely save UTF-8 text
//! which is later read back as Windows-1252, so `'` turns into `â€™` and `♪`
//! into `â™ª`. The model is asked to repair these, but does not always, and
//! it sometimes wraps its whole answer in a code fence or keeps the `...`
//! that caption files start and end with.
//!
//! Every rule here is a pure `&str → String` pass that only ever removes
//! characters. One rule can expose work for an earlier one (stripping a
//! leading `...` can uncover a code fence), so the pipeline is re-run until
//! the text stops changing; since each change shortens the text this always
//! terminates, and `clean(clean(x)) == clean(x)` holds by construction.
//!
//! ## Rule Order
//!
//! Line endings are normalised before fences are detected, encoding repair
//! runs before whitespace collapsing (a repaired dash can sit between two
//! spaces), and ellipsis stripping runs after whitespace trimming so a
//! trailing `...   ` is still recognised.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal mojibake repairs, applied in order.
///
/// Longer sequences come first: every entry except `Ã©` starts with `â€`,
/// so the bare `â€` fallback must run last or it would shadow the others.
pub const ENCODING_REPAIRS: &[(&str, &str)] = &[
    ("â™ª", "♪"),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€\u{201D}", "—"),
    ("â€\u{201C}", "–"),
    ("â€¦", "…"),
    ("Ã©", "é"),
    ("â€", "\""),
];

/// Options for [`clean_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Collapse `we know the--we need` style false starts and `the, the`
    /// repetitions. Heuristic; off by default.
    pub stutter: bool,
}

/// Apply the default cleanup rules (stutter removal off).
pub fn clean(input: &str) -> String {
    clean_with(input, CleanupOptions::default())
}

/// Apply all cleanup rules to formatter output.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 2. Normalise line endings (CRLF/CR → LF)
/// 3. Strip outer markdown fences
/// 4. Repair mis-decoded byte sequences ([`ENCODING_REPAIRS`])
/// 5. Remove stutters *(only with [`CleanupOptions::stutter`])*
/// 6. Collapse interior runs of spaces; trim trailing whitespace per line
/// 7. Strip leading/trailing ellipsis tokens from the document
/// 8. Collapse 3+ consecutive newlines into a single blank line
pub fn clean_with(input: &str, options: CleanupOptions) -> String {
    let mut current = clean_pass(input, options);
    loop {
        let next = clean_pass(&current, options);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(input: &str, options: CleanupOptions) -> String {
    let s = remove_invisible_chars(input);
    let s = normalise_line_endings(&s);
    let s = strip_markdown_fences(&s);
    let s = repair_encoding(&s);
    let s = if options.stutter {
        remove_stutters(&s)
    } else {
        s
    };
    let s = collapse_spaces(&s);
    let s = strip_edge_ellipses(&s);
    collapse_blank_lines(&s)
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text)?\n(.*)\n```\s*$").unwrap()
});

fn strip_markdown_fences(input: &str) -> String {
    let mut current = input.to_string();
    while let Some(caps) = RE_OUTER_FENCES.captures(current.trim()) {
        current = caps[1].to_string();
    }
    current
}

// ── Rule 4: Encoding repair ──────────────────────────────────────────────────

/// Replace every known mojibake sequence with the character it stands for.
///
/// Unknown sequences pass through unchanged. None of the replacement
/// characters can start a pattern, so one pass is a fix-point.
pub fn repair_encoding(input: &str) -> String {
    if !input.contains(['â', 'Ã']) {
        return input.to_string();
    }
    ENCODING_REPAIRS
        .iter()
        .fold(input.to_string(), |s, (from, to)| s.replace(from, to))
}

// ── Rule 5: Stutter removal ──────────────────────────────────────────────────

// Alphabetic words only: `3--5` is a verse range, not a false start.
static RE_DASH_RESTART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z']+--([A-Za-z']+)\b").unwrap()
});

static RE_COMMA_REPEAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z']+), ([A-Za-z']+)\b").unwrap());

fn remove_stutters(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = RE_DASH_RESTART.replace_all(&current, "$1").into_owned();
        let next = RE_COMMA_REPEAT
            .replace_all(&next, |caps: &regex::Captures<'_>| {
                if caps[1].eq_ignore_ascii_case(&caps[2]) {
                    caps[2].to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

// ── Rule 6: Collapse interior whitespace ─────────────────────────────────────

static RE_SPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

fn collapse_spaces(input: &str) -> String {
    input
        .split('\n')
        .map(|line| {
            let (indent, body) = line.split_at(line.len() - line.trim_start().len());
            format!("{}{}", indent, RE_SPACE_RUNS.replace_all(body, " ").trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 7: Strip edge ellipses ──────────────────────────────────────────────

static RE_LEADING_ELLIPSIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\.{3,}|…)\s*").unwrap());

static RE_TRAILING_ELLIPSIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:\.{3,}|…)$").unwrap());

fn strip_edge_ellipses(input: &str) -> String {
    let mut current = input.trim().to_string();
    loop {
        let next = RE_LEADING_ELLIPSIS.replace(&current, "");
        let next = RE_TRAILING_ELLIPSIS.replace(&next, "");
        let next = next.trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

// ── Rule 8: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
