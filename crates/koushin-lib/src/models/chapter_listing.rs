use serde::{Deserialize, Serialize};

/// A type represent one row of a manga's chapter index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChapterListing {
    pub label: String,
    pub title: Option<String>,
    pub date: String,
    pub url: String,
}
