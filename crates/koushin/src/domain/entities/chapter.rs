use chrono::NaiveDateTime;
use koushin_lib::prelude::ChapterNumber;

/// Append-only, `number` is unique within a manga.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub manga_id: i64,
    pub number: f64,
    pub title: Option<String>,
    pub url: String,
    pub uploaded: NaiveDateTime,
    pub date_added: NaiveDateTime,
}

impl Chapter {
    pub fn chapter_number(&self) -> ChapterNumber {
        ChapterNumber::new(self.number)
    }
}
