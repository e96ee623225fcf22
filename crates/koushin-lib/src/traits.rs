use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChapterListing, ChapterNumber, LatestUpdate, MangaDetail};

/// One supported site. Every call hits the remote site, so results reflect
/// whatever the site currently serves.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Registration key, e.g. `https://www.mangaread.org`
    fn base_url(&self) -> &str;

    /// Items listed on the site's update feed. Items missing a title, slug or
    /// chapter label are dropped instead of failing the whole feed.
    async fn get_latest_updates(&self) -> Result<Vec<LatestUpdate>>;

    async fn get_manga_detail(&self, slug: &str) -> Result<MangaDetail>;

    /// Full chapter index, most recent first.
    async fn get_chapter_list(&self, slug: &str) -> Result<Vec<ChapterListing>>;

    fn chapter_url(&self, slug: &str, number: ChapterNumber) -> String {
        format!(
            "{}/manga/{}/chapter-{}/",
            self.base_url().trim_end_matches('/'),
            slug,
            number.slug_fragment()
        )
    }
}
