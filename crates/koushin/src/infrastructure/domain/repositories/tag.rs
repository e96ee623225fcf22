use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{
    domain::{
        entities::tag::Tag,
        repositories::tag::{TagRepository, TagRepositoryError},
    },
    infrastructure::database::Pool,
};

#[derive(Clone)]
pub struct TagRepositoryImpl {
    pool: Pool,
}

impl TagRepositoryImpl {
    pub fn new<P: Into<Pool>>(pool: P) -> Self {
        Self { pool: pool.into() }
    }
}

#[async_trait]
impl TagRepository for TagRepositoryImpl {
    /// Names compare case-insensitively, the stored spelling is returned.
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, TagRepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO tag(name) VALUES (?)")
            .bind(name)
            .execute(&self.pool as &SqlitePool)
            .await?;

        let row = sqlx::query("SELECT id, name FROM tag WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool as &SqlitePool)
            .await?;

        Ok(Tag {
            id: row.get(0),
            name: row.get(1),
        })
    }

    async fn add_tag_to_manga(&self, manga_id: i64, name: &str) -> Result<(), TagRepositoryError> {
        let tag = self.find_or_create_tag(name).await?;

        sqlx::query("INSERT OR IGNORE INTO manga_tag(manga_id, tag_id) VALUES (?, ?)")
            .bind(manga_id)
            .bind(tag.id)
            .execute(&self.pool as &SqlitePool)
            .await?;

        Ok(())
    }
}
