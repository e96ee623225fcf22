use async_trait::async_trait;

use crate::domain::entities::manga::Manga;

/// Hand-off point for newly detected chapters. The engine only knows this
/// capability, delivery lives behind it.
#[async_trait]
pub trait UpdateNotifier: Send + Sync {
    async fn notify_entry_updated(&self, manga: &Manga) -> Result<(), anyhow::Error>;
}
