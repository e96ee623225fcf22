use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::manga::Manga;

#[derive(Debug, Error)]
pub enum MangaRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("manga not found")]
    NotFound,
}

#[async_trait]
pub trait MangaRepository: Send + Sync {
    /// Absence is a normal outcome, not an error.
    async fn get_manga_by_slug(
        &self,
        source_id: i64,
        slug: &str,
    ) -> Result<Option<Manga>, MangaRepositoryError>;

    /// Sets `manga.id` on success. Tags are not written here.
    async fn insert_manga(&self, manga: &mut Manga) -> Result<(), MangaRepositoryError>;

    async fn update_manga(&self, manga: &Manga) -> Result<(), MangaRepositoryError>;
}
