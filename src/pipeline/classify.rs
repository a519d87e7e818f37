//! Line classification: decide what one markup line is.
//!
//! Several categories look alike on the page (a bold title and a bold
//! numbered header, a speaker label and a Scripture citation both contain a
//! colon), so the rules are evaluated in a fixed precedence order and the
//! first match wins:
//!
//! 1. empty after trimming → [`Category::Blank`]
//! 2. starts with at least ten dash-like characters → [`Category::Divider`]
//! 3. one bold region spanning the whole line, near the top → [`Category::Title`]
//! 4. `N. text`, optionally bold-wrapped → [`Category::SectionHeader`]
//! 5. starts with `♪` → [`Category::LyricLine`]
//! 6. a name followed by a colon → [`Category::SpeakerHeader`]
//! 7. anything else → [`Category::Plain`]
//!
//! Speaker detection is a heuristic: any `Word: rest of sentence` line whose
//! prefix looks like a name matches, so a line such as `Note: bring a Bible`
//! is classified as a speaker line. That is a known limitation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a markup line is, structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Blank,
    Divider,
    Title,
    SpeakerHeader,
    SectionHeader,
    LyricLine,
    Plain,
}

/// Where a line sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinePosition {
    /// 0-based index of the line in the markup.
    pub line_index: usize,
    /// Blocks the renderer will have emitted before this line.
    pub blocks_so_far: usize,
}

/// Titles are only recognised while fewer than this many blocks exist.
pub const TITLE_WINDOW: usize = 5;

/// Minimum number of dash-like characters in a divider line.
pub const DIVIDER_MIN_LEN: usize = 10;

/// A speaker label's colon must appear within this many characters.
pub const SPEAKER_COLON_WINDOW: usize = 50;

const NOTE: char = '♪';

static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*\*\d+\.\s+[^*]+\*\*|\d+\.\s+\S.*)$").unwrap());

static RE_SPEAKER_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s()]+:$").unwrap());

/// A leading run of [`DIVIDER_MIN_LEN`] or more dash-like characters.
static RE_DIVIDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-_─━]{10,}").unwrap());

/// Classify one line. Pure: depends only on `line` and `position`.
pub fn classify(line: &str, position: LinePosition) -> Category {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Category::Blank;
    }
    if is_divider(trimmed) {
        return Category::Divider;
    }
    if position.blocks_so_far < TITLE_WINDOW && is_bold_wrapped(trimmed) {
        return Category::Title;
    }
    classify_content(trimmed)
}

/// Rules 4–7 only.
///
/// Used for lines that cannot be blank, a divider or the title, e.g. a
/// second title candidate after the title has been taken.
pub fn classify_content(line: &str) -> Category {
    let trimmed = line.trim();
    if RE_SECTION.is_match(trimmed) {
        Category::SectionHeader
    } else if trimmed.starts_with(NOTE) {
        Category::LyricLine
    } else if speaker_label_end(trimmed).is_some() {
        Category::SpeakerHeader
    } else {
        Category::Plain
    }
}

/// Anything after the leading run, e.g. a caption in
/// `---------- Notes ----------`, does not stop the line being a divider.
pub fn is_divider(trimmed: &str) -> bool {
    RE_DIVIDER.is_match(trimmed)
}

/// `**…**` around the whole line, one region, non-empty content.
pub fn is_bold_wrapped(trimmed: &str) -> bool {
    trimmed.len() > 4
        && trimmed.starts_with("**")
        && trimmed.ends_with("**")
        && !trimmed[2..trimmed.len() - 2].contains("**")
        && !trimmed[2..trimmed.len() - 2].trim().is_empty()
}

/// True when the line holds nothing but note symbols and whitespace.
pub fn is_only_notes(trimmed: &str) -> bool {
    trimmed.chars().all(|c| c == NOTE || c.is_whitespace())
}

/// Byte offset just past a speaker label (`Name:` or `**Name:**`), if the
/// line starts with one.
pub fn speaker_label_end(line: &str) -> Option<usize> {
    let colon = line.find(':')?;
    if line[..colon].chars().count() >= SPEAKER_COLON_WINDOW {
        return None;
    }
    let name = line[..colon].replace('*', "");
    let name = name.trim();
    let whole_line = line.replace('*', "");
    if !(RE_SPEAKER_ONLY.is_match(whole_line.trim()) || looks_like_name(name)) {
        return None;
    }
    // Swallow a bold delimiter that closes right after the colon.
    let mut end = colon + 1;
    if line[..colon].contains("**") && line[end..].starts_with("**") {
        end += 2;
    }
    Some(end)
}

/// Capitalised, at most six words, letters and name punctuation only.
fn looks_like_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    first.is_uppercase()
        && name.split_whitespace().count() <= 6
        && name
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '.' | '\'' | '-' | '(' | ')' | '&'))
}

/// Title or header text with emphasis markers and surrounding space removed.
pub fn strip_wrapping(line: &str) -> String {
    line.trim().trim_matches('*').trim().to_string()
}
