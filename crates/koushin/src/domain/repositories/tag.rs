use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::tag::Tag;

#[derive(Debug, Error)]
pub enum TagRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, TagRepositoryError>;

    /// Creates the tag when missing, attaching it twice is a no-op.
    async fn add_tag_to_manga(&self, manga_id: i64, name: &str) -> Result<(), TagRepositoryError>;
}
