use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use itertools::Itertools;
use koushin_lib::prelude::{ChapterNumber, LatestUpdate, Scraper};
use koushin_source::date::parse_update_date;
use thiserror::Error;

use crate::domain::{
    entities::{chapter::Chapter, manga::Manga, source::Source},
    repositories::{
        chapter::{ChapterRepository, ChapterRepositoryError},
        manga::{MangaRepository, MangaRepositoryError},
        tag::TagRepository,
    },
    services::{cadence::estimate_next_release, notifier::UpdateNotifier},
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("source return error: {0}")]
    SourceError(#[from] koushin_lib::error::Error),
    #[error("source did not answer within {0:?}")]
    Timeout(Duration),
    #[error("manga repository error: {0}")]
    MangaError(#[from] MangaRepositoryError),
    #[error("chapter repository error: {0}")]
    ChapterError(#[from] ChapterRepositoryError),
}

/// Runs an adapter call, giving up after `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, ReconcileError>
where
    F: Future<Output = koushin_lib::error::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(ReconcileError::Timeout(timeout)),
    }
}

/// A chapter appended to the catalog
#[derive(Debug, Clone)]
pub struct ChapterUpdate {
    pub manga: Manga,
    pub chapter: Chapter,
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub unchanged: usize,
    /// Items whose chapter label carries no number
    pub skipped: usize,
    pub failed: usize,
    pub updates: Vec<ChapterUpdate>,
}

/// Per manga locks, held from lookup up to the chapter append so two
/// overlapping reconciliations cannot both create the same manga or chapter.
#[derive(Clone, Default)]
pub struct EntryLocks {
    locks: Arc<Mutex<HashMap<(i64, String), Arc<tokio::sync::Mutex<()>>>>>,
}

impl EntryLocks {
    pub fn get(&self, source_id: i64, slug: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // only the map itself holds idle locks
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry((source_id, slug.to_string()))
            .or_default()
            .clone()
    }
}

/// Trims, drops empty names and collapses duplicates ignoring case, keeping
/// the first spelling.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.split_whitespace().join(" "))
        .filter(|tag| !tag.is_empty())
        .unique_by(|tag| tag.to_lowercase())
        .collect()
}

pub struct CatalogReconciler<M, C, T>
where
    M: MangaRepository,
    C: ChapterRepository,
    T: TagRepository,
{
    manga_repo: M,
    chapter_repo: C,
    tag_repo: T,
    notifier: Arc<dyn UpdateNotifier>,
    locks: EntryLocks,
    fetch_timeout: Duration,
}

impl<M, C, T> CatalogReconciler<M, C, T>
where
    M: MangaRepository,
    C: ChapterRepository,
    T: TagRepository,
{
    pub fn new(manga_repo: M, chapter_repo: C, tag_repo: T, notifier: Arc<dyn UpdateNotifier>) -> Self {
        Self {
            manga_repo,
            chapter_repo,
            tag_repo,
            notifier,
            locks: EntryLocks::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    /// Matches every update against the catalog. A failing item is logged
    /// and counted, it never stops the remaining items.
    pub async fn reconcile(
        &self,
        source: &Source,
        scraper: &dyn Scraper,
        updates: Vec<LatestUpdate>,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        // newest chapter attempted per slug during this call, even if persisting it failed
        let mut attempted: HashMap<String, ChapterNumber> = HashMap::new();

        for update in updates {
            if let Err(e) = self
                .reconcile_update(source, scraper, &update, &mut attempted, &mut outcome)
                .await
            {
                error!(
                    "failed to reconcile {} from {}, reason: {e}",
                    update.slug, source.url
                );
                outcome.failed += 1;
            }
        }

        outcome
    }

    async fn reconcile_update(
        &self,
        source: &Source,
        scraper: &dyn Scraper,
        update: &LatestUpdate,
        attempted: &mut HashMap<String, ChapterNumber>,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), ReconcileError> {
        let Some(number) = ChapterNumber::parse(&update.chapter) else {
            warn!(
                "skip {}: no chapter number in {:?}",
                update.slug, update.chapter
            );
            outcome.skipped += 1;
            return Ok(());
        };

        let lock = self.locks.get(source.id, &update.slug);
        let _guard = lock.lock().await;

        let mut manga = match self
            .manga_repo
            .get_manga_by_slug(source.id, &update.slug)
            .await?
        {
            Some(manga) => manga,
            None => {
                let manga = self
                    .create_manga(source, scraper, &update.slug, number)
                    .await?;
                outcome.created += 1;
                manga
            }
        };

        let current = attempted.get(&update.slug).copied().or_else(|| {
            manga
                .last_chapter
                .as_deref()
                .and_then(ChapterNumber::parse)
        });
        if !number.is_newer_than(current) {
            trace!("{} has no new chapters", manga.title);
            outcome.unchanged += 1;
            return Ok(());
        }

        let now = Utc::now().naive_utc();
        let mut chapter = Chapter {
            id: 0,
            manga_id: manga.id,
            number: number.value(),
            title: None,
            url: scraper.chapter_url(&update.slug, number),
            uploaded: parse_update_date(&update.updated, now).unwrap_or(now),
            date_added: now,
        };

        attempted.insert(update.slug.clone(), number);
        self.chapter_repo.insert_chapter(&mut chapter).await?;

        manga.last_chapter = Some(update.chapter.clone());
        manga.last_uploaded_at = Some(now);
        let chapters = self
            .chapter_repo
            .get_chapters_by_manga_id(manga.id)
            .await?;
        manga.next_release_at = Some(estimate_next_release(&chapters, now));
        self.manga_repo.update_manga(&manga).await?;

        info!("{} has new chapter {}", manga.title, update.chapter);

        if let Err(e) = self.notifier.notify_entry_updated(&manga).await {
            error!("failed to send update notification for {}: {e}", manga.title);
        }

        outcome.updates.push(ChapterUpdate { manga, chapter });

        Ok(())
    }

    async fn create_manga(
        &self,
        source: &Source,
        scraper: &dyn Scraper,
        slug: &str,
        number: ChapterNumber,
    ) -> Result<Manga, ReconcileError> {
        let detail = with_timeout(self.fetch_timeout, scraper.get_manga_detail(slug)).await?;
        let tags = normalize_tags(&detail.tags);

        let mut manga = Manga::from_detail(source.id, slug, detail, Utc::now().naive_utc());
        self.manga_repo.insert_manga(&mut manga).await?;
        info!("added {} from {}", manga.title, source.name);

        for tag in tags {
            match self.tag_repo.add_tag_to_manga(manga.id, &tag).await {
                Ok(()) => manga.tags.push(tag),
                Err(e) => error!("failed to tag {} with {tag}, reason: {e}", manga.title),
            }
        }

        match self.backfill_chapters(scraper, &manga, number).await {
            Ok(count) => debug!("backfilled {count} chapters of {}", manga.title),
            Err(e) => error!("failed to backfill chapters of {}, reason: {e}", manga.title),
        }

        Ok(manga)
    }

    /// Stores history older than `before` so cadence estimation has data
    /// right away. The update itself is appended by the caller.
    async fn backfill_chapters(
        &self,
        scraper: &dyn Scraper,
        manga: &Manga,
        before: ChapterNumber,
    ) -> Result<usize, ReconcileError> {
        let listings =
            with_timeout(self.fetch_timeout, scraper.get_chapter_list(&manga.slug)).await?;
        let now = Utc::now().naive_utc();

        let mut count = 0;
        for listing in listings.into_iter().rev() {
            let Some(number) = ChapterNumber::parse(&listing.label) else {
                continue;
            };
            if number >= before {
                continue;
            }
            let Some(uploaded) = parse_update_date(&listing.date, now) else {
                continue;
            };

            let mut chapter = Chapter {
                id: 0,
                manga_id: manga.id,
                number: number.value(),
                title: listing.title,
                url: if listing.url.is_empty() {
                    scraper.chapter_url(&manga.slug, number)
                } else {
                    listing.url
                },
                uploaded,
                date_added: now,
            };

            match self.chapter_repo.insert_chapter(&mut chapter).await {
                Ok(()) => count += 1,
                Err(e) => error!("failed to backfill {} {number}: {e}", manga.title),
            }
        }

        Ok(count)
    }
}
