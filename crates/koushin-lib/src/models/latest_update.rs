use serde::{Deserialize, Serialize};

/// One entry of a site's update feed, as scraped
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LatestUpdate {
    pub title: String,
    /// Stable per-manga identifier taken from the item's canonical link
    pub slug: String,
    /// Free-form label such as `Chapter 123.5`
    pub chapter: String,
    /// Site specific, e.g. `2 hours ago` or `May 3, 2024`
    pub updated: String,
}
