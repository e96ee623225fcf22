use chrono::{Duration, NaiveDateTime};

use crate::domain::entities::chapter::Chapter;

/// Used when there is not enough history to measure a gap.
pub const DEFAULT_CADENCE_DAYS: i64 = 7;

/// Next expected release: the newest release plus the mean gap between
/// consecutive releases. With fewer than two chapters this is `now` plus a
/// week, whatever the chapters hold.
pub fn estimate_next_release(chapters: &[Chapter], now: NaiveDateTime) -> NaiveDateTime {
    if chapters.len() < 2 {
        return now + Duration::days(DEFAULT_CADENCE_DAYS);
    }

    let mut released: Vec<NaiveDateTime> = chapters.iter().map(|c| c.uploaded).collect();
    released.sort();

    // sum of consecutive gaps telescopes to last - first
    let (first, last) = (released[0], released[released.len() - 1]);
    let gaps = (released.len() - 1) as i64;
    let mean_gap = Duration::milliseconds((last - first).num_milliseconds() / gaps);

    last + mean_gap
}
