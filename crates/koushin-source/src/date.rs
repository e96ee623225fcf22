use chrono::{Duration, NaiveDate, NaiveDateTime};
use fancy_regex::Regex;
use once_cell::sync::Lazy;

const RELATIVE_PATTERN: &str =
    r"(?i)^(\d+|an?|one)\s*(sec|second|min|minute|hour|hr|day|week|month|year)s?\s+ago$";

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(RELATIVE_PATTERN).expect("relative date regex should compile"));

const ABSOLUTE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

/// Turns a site's update-date text into a timestamp relative to `now`.
///
/// Understands `just now`, `yesterday`, `<n> <unit>s ago` and a handful of
/// absolute date layouts. Returns `None` for anything else so the caller can
/// fall back to the observation time.
pub fn parse_update_date(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if raw.is_empty() {
        return None;
    }

    match raw.to_lowercase().as_str() {
        "just now" | "now" | "today" => return Some(now),
        "yesterday" => return Some(now - Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&raw).ok().flatten() {
        let amount = match caps.get(1).map(|m| m.as_str().to_lowercase()) {
            Some(n) if n == "a" || n == "an" || n == "one" => 1,
            Some(n) => n.parse::<i64>().ok()?,
            None => return None,
        };
        let unit = caps.get(2)?.as_str().to_lowercase();
        let delta = match unit.as_str() {
            "sec" | "second" => Duration::seconds(amount),
            "min" | "minute" => Duration::minutes(amount),
            "hour" | "hr" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            "month" => Duration::days(30 * amount),
            "year" => Duration::days(365 * amount),
            _ => return None,
        };
        return now.checked_sub_signed(delta);
    }

    ABSOLUTE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
