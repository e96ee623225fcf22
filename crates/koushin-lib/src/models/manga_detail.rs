use serde::{Deserialize, Serialize};

/// A type represent manga details, normalized across source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MangaDetail {
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub cover_url: Option<String>,
    pub tags: Vec<String>,
}
