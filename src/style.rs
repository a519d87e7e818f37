//! Immutable styling data shared by the splitter and the renderer.
//!
//! Fonts, colors, sizes, page margins, the footer/trailer text and the
//! Scripture book table all live in one [`StyleSheet`]. Nothing here is
//! mutated after construction, so a single sheet can be shared across any
//! number of concurrent renders (by reference or behind an `Arc`), and tests
//! can render with an overridden sheet without touching global state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Upper-case hex without the leading `#`, e.g. `0563C1`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// Parse six hex digits, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub fn uniform(inches: f32) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }
}

/// Canonical names of the 66 books of the Protestant canon, plus the common
/// singular `Psalm`. Matching is whole-token and case-sensitive.
pub const SCRIPTURE_BOOKS: &[&str] = &[
    // Old Testament
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy", "Joshua", "Judges", "Ruth",
    "Samuel", "Kings", "Chronicles", "Ezra", "Nehemiah", "Esther", "Job", "Psalms", "Psalm",
    "Proverbs", "Ecclesiastes", "Song of Solomon", "Song of Songs", "Isaiah", "Jeremiah",
    "Lamentations", "Ezekiel", "Daniel", "Hosea", "Joel", "Amos", "Obadiah", "Jonah", "Micah",
    "Nahum", "Habakkuk", "Zephaniah", "Haggai", "Zechariah", "Malachi",
    // New Testament
    "Matthew", "Mark", "Luke", "John", "Acts", "Romans", "Corinthians", "Galatians",
    "Ephesians", "Philippians", "Colossians", "Thessalonians", "Timothy", "Titus", "Philemon",
    "Hebrews", "James", "Peter", "Jude", "Revelation",
];

/// Fixed attribution text of the repeating page footer.
pub const DEFAULT_FOOTER: &str = "Transcript formatted with AI assistance";

/// Text of the trailing license paragraph.
pub const DEFAULT_TRAILER: &str =
    "© All rights reserved. This transcript is provided for personal study and may not be redistributed.";

/// All presentation constants used while building an `OutputDocument`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSheet {
    pub body_font: String,
    pub body_size: f32,
    /// Space after an ordinary paragraph, in points.
    pub body_spacing_after: f32,

    pub title_font: String,
    pub title_size: f32,
    pub title_spacing_after: f32,

    pub heading_font: String,
    pub heading_size: f32,
    pub heading_spacing_before: f32,
    pub heading_spacing_after: f32,

    pub text_color: Rgb,
    pub scripture_color: Rgb,
    pub quote_color: Rgb,
    pub lyric_color: Rgb,

    pub footer_text: String,
    pub footer_size: f32,
    pub footer_color: Rgb,

    /// `None` disables the trailing license paragraph.
    pub trailer_text: Option<String>,
    pub trailer_size: f32,
    pub trailer_color: Rgb,

    pub margins: Margins,

    /// Italic spans longer than this many characters are tagged as long quotes.
    pub long_quote_chars: usize,

    pub scripture_books: Vec<String>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            body_font: "Calibri".into(),
            body_size: 11.0,
            body_spacing_after: 6.0,
            title_font: "Arial".into(),
            title_size: 20.0,
            title_spacing_after: 12.0,
            heading_font: "Calibri".into(),
            heading_size: 14.0,
            heading_spacing_before: 12.0,
            heading_spacing_after: 6.0,
            text_color: Rgb::BLACK,
            scripture_color: Rgb(5, 99, 193),
            quote_color: Rgb(89, 89, 89),
            lyric_color: Rgb(89, 89, 89),
            footer_text: DEFAULT_FOOTER.into(),
            footer_size: 8.0,
            footer_color: Rgb(150, 150, 150),
            trailer_text: Some(DEFAULT_TRAILER.into()),
            trailer_size: 9.0,
            trailer_color: Rgb(128, 128, 128),
            margins: Margins::uniform(1.0),
            long_quote_chars: 50,
            scripture_books: SCRIPTURE_BOOKS.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl StyleSheet {
    /// Build the token index used by [`BookIndex::mentions_book`].
    pub fn book_index(&self) -> BookIndex {
        BookIndex::new(self.scripture_books.iter().map(String::as_str))
    }
}

/// Whole-token lookup over Scripture book names.
///
/// Single-word names go into a hash set; multi-word names ("Song of
/// Solomon") are matched as consecutive token windows.
#[derive(Debug, Clone, Default)]
pub struct BookIndex {
    single: HashSet<String>,
    multi: Vec<Vec<String>>,
}

impl BookIndex {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            let words: Vec<String> = tokens(name).map(str::to_string).collect();
            match words.len() {
                0 => {}
                1 => {
                    index.single.insert(words.into_iter().next().unwrap_or_default());
                }
                _ => index.multi.push(words),
            }
        }
        index
    }

    /// True when `text` contains a book name as whole tokens.
    pub fn mentions_book(&self, text: &str) -> bool {
        let words: Vec<&str> = tokens(text).collect();
        if words.iter().any(|w| self.single.contains(*w)) {
            return true;
        }
        self.multi.iter().any(|book| {
            words
                .windows(book.len())
                .any(|win| win.iter().zip(book).all(|(a, b)| *a == b))
        })
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}
