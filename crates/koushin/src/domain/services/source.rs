use koushin_source::registry::normalize_base_url;
use thiserror::Error;

use crate::domain::{
    entities::source::Source,
    repositories::source::{SourceRepository, SourceRepositoryError},
};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source repository error: {0}")]
    RepositoryError(#[from] SourceRepositoryError),
    #[error("invalid source url {0:?}, expected http(s)://host")]
    InvalidUrl(String),
    #[error("source name must not be empty")]
    EmptyName,
}

#[derive(Clone)]
pub struct SourceService<R>
where
    R: SourceRepository,
{
    repo: R,
}

impl<R> SourceService<R>
where
    R: SourceRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The url is stored normalized so it matches the adapter registry key.
    pub async fn register_source(&self, url: &str, name: &str) -> Result<Source, SourceError> {
        let url = normalize_base_url(url);
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or_default();
        if host.is_empty() {
            return Err(SourceError::InvalidUrl(url));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(SourceError::EmptyName);
        }

        let mut source = Source::new(url, name);
        self.repo.insert_source(&mut source).await?;
        info!("registered source {} at {}", source.name, source.url);

        Ok(source)
    }

    /// Registers the source unless one with the same url exists.
    pub async fn ensure_source(&self, url: &str, name: &str) -> Result<Source, SourceError> {
        let normalized = normalize_base_url(url);
        if let Some(source) = self
            .repo
            .get_sources()
            .await?
            .into_iter()
            .find(|source| source.url == normalized)
        {
            return Ok(source);
        }

        self.register_source(url, name).await
    }

    pub async fn get_sources(&self) -> Result<Vec<Source>, SourceError> {
        let sources = self.repo.get_sources().await?;

        Ok(sources)
    }

    pub async fn get_source_by_id(&self, id: i64) -> Result<Source, SourceError> {
        let source = self.repo.get_source_by_id(id).await?;

        Ok(source)
    }
}
