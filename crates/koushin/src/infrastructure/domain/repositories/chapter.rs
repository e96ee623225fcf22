use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{
    domain::{
        entities::chapter::Chapter,
        repositories::chapter::{ChapterRepository, ChapterRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct ChapterRepositoryImpl {
    pool: Pool,
}

impl ChapterRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

#[async_trait]
impl ChapterRepository for ChapterRepositoryImpl {
    async fn insert_chapter(&self, chapter: &mut Chapter) -> Result<(), ChapterRepositoryError> {
        let res = sqlx::query(
            r#"INSERT INTO chapter(
                manga_id,
                number,
                title,
                url,
                uploaded,
                date_added
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(manga_id, number) DO NOTHING"#,
        )
        .bind(chapter.manga_id)
        .bind(chapter.number)
        .bind(&chapter.title)
        .bind(&chapter.url)
        .bind(chapter.uploaded)
        .bind(chapter.date_added)
        .execute(&self.pool as &SqlitePool)
        .await?;

        if res.rows_affected() > 0 {
            chapter.id = res.last_insert_rowid();
        } else {
            debug!("chapter {} of manga {} already stored", chapter.number, chapter.manga_id);
            chapter.id = sqlx::query("SELECT id FROM chapter WHERE manga_id = ? AND number = ?")
                .bind(chapter.manga_id)
                .bind(chapter.number)
                .fetch_one(&self.pool as &SqlitePool)
                .await?
                .get(0);
        }

        Ok(())
    }

    async fn get_chapters_by_manga_id(
        &self,
        manga_id: i64,
    ) -> Result<Vec<Chapter>, ChapterRepositoryError> {
        let chapters = sqlx::query(
            r#"SELECT id, manga_id, number, title, url, uploaded, date_added
            FROM chapter WHERE manga_id = ? ORDER BY uploaded ASC, number ASC"#,
        )
        .bind(manga_id)
        .fetch_all(&self.pool as &SqlitePool)
        .await?
        .into_iter()
        .map(|row| Chapter {
            id: row.get(0),
            manga_id: row.get(1),
            number: row.get(2),
            title: row.get(3),
            url: row.get(4),
            uploaded: row.get(5),
            date_added: row.get(6),
        })
        .collect();

        Ok(chapters)
    }
}
