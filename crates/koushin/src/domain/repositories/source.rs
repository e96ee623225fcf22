use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::source::Source;

#[derive(Debug, Error)]
pub enum SourceRepositoryError {
    #[error("database return error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("source {0} already registered")]
    Duplicate(String),
    #[error("source not found")]
    NotFound,
}

#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn get_sources(&self) -> Result<Vec<Source>, SourceRepositoryError>;

    async fn get_source_by_id(&self, id: i64) -> Result<Source, SourceRepositoryError>;

    /// Sets `source.id` on success.
    async fn insert_source(&self, source: &mut Source) -> Result<(), SourceRepositoryError>;

    async fn update_source(&self, source: &Source) -> Result<(), SourceRepositoryError>;
}
