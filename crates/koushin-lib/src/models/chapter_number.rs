use std::{cmp::Ordering, fmt, str::FromStr};

use fancy_regex::Regex;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const KEYWORD_NUMBER_PATTERN: &str = r"(?i)\b(?:chapter|chap|ch|episode|ep)\.?\s*(\d+(?:\.\d+)?)";
const NUMBER_PATTERN: &str = r"\d+(?:\.\d+)?";

static KEYWORD_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(KEYWORD_NUMBER_PATTERN).expect("chapter keyword regex should compile")
});

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(NUMBER_PATTERN).expect("number regex should compile"));

/// Numeric position of a chapter within its manga.
///
/// Labels are compared by value, so `Chapter 10` is newer than `Chapter 9`
/// and `10.5` is newer than `10.2`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterNumber(f64);

impl ChapterNumber {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Extracts the number from a free-form label.
    ///
    /// A number following a chapter keyword (`Chapter`, `Ch.`, `Ep`) wins,
    /// otherwise the last numeric token of the label is used.
    pub fn parse(label: &str) -> Option<Self> {
        let keyword = KEYWORD_NUMBER_RE
            .captures(label)
            .ok()
            .flatten()
            .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()));

        let token = match keyword {
            Some(token) => token,
            None => NUMBER_RE
                .find_iter(label)
                .filter_map(|m| m.ok())
                .last()
                .map(|m| m.as_str().to_string())?,
        };

        token.parse::<f64>().ok().filter(|n| n.is_finite()).map(Self)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `10.5` becomes `10-5`, as used in chapter urls
    pub fn slug_fragment(self) -> String {
        self.to_string().replace('.', "-")
    }

    /// `None` means nothing was recorded yet, so anything is newer.
    pub fn is_newer_than(self, current: Option<ChapterNumber>) -> bool {
        current.is_none_or(|current| self > current)
    }
}

impl PartialEq for ChapterNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChapterNumber {}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl FromStr for ChapterNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::InvalidChapter(s.to_string()))
    }
}

impl From<f64> for ChapterNumber {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn newer(candidate: &str, current: Option<&str>) -> bool {
        ChapterNumber::parse(candidate)
            .is_some_and(|c| c.is_newer_than(current.and_then(ChapterNumber::parse)))
    }

    #[test]
    fn test_patterns_compile() {
        assert!(Regex::new(KEYWORD_NUMBER_PATTERN).is_ok());
        assert!(Regex::new(NUMBER_PATTERN).is_ok());
    }

    #[test]
    fn test_parse_chapter_labels() {
        assert_eq!(ChapterNumber::parse("Chapter 123"), Some(ChapterNumber::new(123.0)));
        assert_eq!(ChapterNumber::parse("Chapter 123.5"), Some(ChapterNumber::new(123.5)));
        assert_eq!(ChapterNumber::parse("Ch. 7"), Some(ChapterNumber::new(7.0)));
        assert_eq!(ChapterNumber::parse("chapter15"), Some(ChapterNumber::new(15.0)));
        assert_eq!(ChapterNumber::parse("42"), Some(ChapterNumber::new(42.0)));
        assert_eq!(ChapterNumber::parse("Vol. 2 Chapter 15"), Some(ChapterNumber::new(15.0)));
        assert_eq!(
            ChapterNumber::parse("Chapter 5 - 2 Years Later"),
            Some(ChapterNumber::new(5.0))
        );
        assert_eq!(ChapterNumber::parse("Vol. 3 - 21"), Some(ChapterNumber::new(21.0)));
    }

    #[test]
    fn test_parse_label_without_number() {
        assert_eq!(ChapterNumber::parse("Oneshot"), None);
        assert_eq!(ChapterNumber::parse(""), None);
        assert!("Prologue".parse::<ChapterNumber>().is_err());
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(newer("10", Some("9")));
        assert!(newer("Chapter 10", Some("Chapter 9")));
        assert!(newer("10.5", Some("10.2")));
        assert!(newer("Chapter 100", Some("Chapter 99.5")));
        assert!(!newer("Chapter 9", Some("Chapter 10")));
        assert!(!newer("Chapter 10", Some("Chapter 10")));
    }

    #[test]
    fn test_newer_than_missing_or_unparseable() {
        assert!(newer("Chapter 1", None));
        assert!(newer("Chapter 1", Some("Teaser")));
        assert!(!newer("Special", Some("Chapter 1")));
        assert!(!newer("Special", None));
    }

    #[test]
    fn test_display_and_slug_fragment() {
        assert_eq!(ChapterNumber::new(12.0).to_string(), "12");
        assert_eq!(ChapterNumber::new(10.5).to_string(), "10.5");
        assert_eq!(ChapterNumber::new(10.5).slug_fragment(), "10-5");
        assert_eq!(ChapterNumber::new(3.0).slug_fragment(), "3");
    }
}
