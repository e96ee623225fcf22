use chrono::NaiveDateTime;
use koushin_lib::prelude::MangaDetail;

#[derive(Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: i64,
    pub source_id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub cover_url: Option<String>,
    /// Label of the newest chapter seen, as the site wrote it
    pub last_chapter: Option<String>,
    pub last_uploaded_at: Option<NaiveDateTime>,
    pub next_release_at: Option<NaiveDateTime>,
    pub date_added: NaiveDateTime,
    pub tags: Vec<String>,
}

impl Default for Manga {
    fn default() -> Self {
        Self {
            id: 0,
            source_id: 0,
            slug: "".to_string(),
            title: "".to_string(),
            description: None,
            author: None,
            status: None,
            cover_url: None,
            last_chapter: None,
            last_uploaded_at: None,
            next_release_at: None,
            date_added: NaiveDateTime::default(),
            tags: vec![],
        }
    }
}

impl Manga {
    /// Tags are left empty, they are attached one by one after insert.
    pub fn from_detail(
        source_id: i64,
        slug: &str,
        detail: MangaDetail,
        date_added: NaiveDateTime,
    ) -> Self {
        Self {
            source_id,
            slug: slug.to_string(),
            title: detail.title,
            description: detail.description,
            author: detail.author,
            status: detail.status,
            cover_url: detail.cover_url,
            date_added,
            ..Default::default()
        }
    }
}
