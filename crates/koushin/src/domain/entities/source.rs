use chrono::{Duration, NaiveDateTime};

/// A registered site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: i64,
    /// Unique across sources, also the key into the adapter registry
    pub url: String,
    pub name: String,
    /// Last time a poll of this source completed
    pub last_checked: Option<NaiveDateTime>,
}

impl Source {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            url: url.into(),
            name: name.into(),
            last_checked: None,
        }
    }

    /// A source that was never polled is always stale.
    pub fn is_stale(&self, now: NaiveDateTime, poll_interval: Duration) -> bool {
        self.last_checked
            .is_none_or(|last_checked| now - last_checked >= poll_interval)
    }
}
