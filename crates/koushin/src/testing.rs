//! In-memory repositories and a scripted scraper for service tests.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use koushin_lib::{
    error::{Error, Result as ScraperResult},
    prelude::{ChapterListing, LatestUpdate, MangaDetail, Scraper},
};

use crate::domain::{
    entities::{chapter::Chapter, manga::Manga, source::Source, tag::Tag},
    repositories::{
        chapter::{ChapterRepository, ChapterRepositoryError},
        manga::{MangaRepository, MangaRepositoryError},
        source::{SourceRepository, SourceRepositoryError},
        tag::{TagRepository, TagRepositoryError},
    },
    services::notifier::UpdateNotifier,
};

#[derive(Default)]
struct State {
    next_id: i64,
    sources: Vec<Source>,
    manga: Vec<Manga>,
    chapters: Vec<Chapter>,
    tags: Vec<Tag>,
    manga_tags: Vec<(i64, i64)>,
    fail_chapter_inserts: bool,
    fail_source_updates: bool,
    fail_manga_updates: bool,
    failing_tags: Vec<String>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tags_of(&self, manga_id: i64) -> Vec<String> {
        self.manga_tags
            .iter()
            .filter(|(m, _)| *m == manga_id)
            .filter_map(|(_, t)| self.tags.iter().find(|tag| tag.id == *t))
            .map(|tag| tag.name.clone())
            .collect()
    }

    fn with_tags(&self, manga: &Manga) -> Manga {
        Manga {
            tags: self.tags_of(manga.id),
            ..manga.clone()
        }
    }
}

/// Shared state, clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<State>>,
}

impl MemoryCatalog {
    pub fn add_source(&self, url: &str, last_checked: Option<NaiveDateTime>) -> Source {
        let mut state = self.state.lock().unwrap();
        let source = Source {
            id: state.next_id(),
            url: url.to_string(),
            name: url.to_string(),
            last_checked,
        };
        state.sources.push(source.clone());
        source
    }

    pub fn add_manga(&self, source_id: i64, slug: &str, last_chapter: Option<&str>) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.manga.push(Manga {
            id,
            source_id,
            slug: slug.to_string(),
            title: slug.to_string(),
            last_chapter: last_chapter.map(str::to_string),
            date_added: Utc::now().naive_utc(),
            ..Default::default()
        });
        id
    }

    pub fn source(&self, id: i64) -> Source {
        let state = self.state.lock().unwrap();
        state.sources.iter().find(|s| s.id == id).cloned().unwrap()
    }

    pub fn set_last_checked(&self, id: i64, last_checked: Option<NaiveDateTime>) {
        let mut state = self.state.lock().unwrap();
        if let Some(source) = state.sources.iter_mut().find(|s| s.id == id) {
            source.last_checked = last_checked;
        }
    }

    pub fn manga_by_slug(&self, source_id: i64, slug: &str) -> Option<Manga> {
        let state = self.state.lock().unwrap();
        state
            .manga
            .iter()
            .find(|m| m.source_id == source_id && m.slug == slug)
            .map(|m| state.with_tags(m))
    }

    pub fn manga_count(&self) -> usize {
        self.state.lock().unwrap().manga.len()
    }

    pub fn chapters_of(&self, manga_id: i64) -> Vec<Chapter> {
        let state = self.state.lock().unwrap();
        let mut chapters: Vec<Chapter> = state
            .chapters
            .iter()
            .filter(|c| c.manga_id == manga_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.uploaded);
        chapters
    }

    pub fn tags_of(&self, manga_id: i64) -> Vec<String> {
        self.state.lock().unwrap().tags_of(manga_id)
    }

    pub fn fail_chapter_inserts(&self, fail: bool) {
        self.state.lock().unwrap().fail_chapter_inserts = fail;
    }

    pub fn fail_source_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_source_updates = fail;
    }

    pub fn fail_manga_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_manga_updates = fail;
    }

    /// Attaching `name` to any manga fails from now on.
    pub fn fail_tag(&self, name: &str) {
        self.state.lock().unwrap().failing_tags.push(name.to_string());
    }
}

#[async_trait]
impl SourceRepository for MemoryCatalog {
    async fn get_sources(&self) -> Result<Vec<Source>, SourceRepositoryError> {
        Ok(self.state.lock().unwrap().sources.clone())
    }

    async fn get_source_by_id(&self, id: i64) -> Result<Source, SourceRepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(SourceRepositoryError::NotFound)
    }

    async fn insert_source(&self, source: &mut Source) -> Result<(), SourceRepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.sources.iter().any(|s| s.url == source.url) {
            return Err(SourceRepositoryError::Duplicate(source.url.clone()));
        }
        source.id = state.next_id();
        state.sources.push(source.clone());
        Ok(())
    }

    async fn update_source(&self, source: &Source) -> Result<(), SourceRepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_source_updates {
            return Err(SourceRepositoryError::DbError(sqlx::Error::PoolTimedOut));
        }
        let stored = state
            .sources
            .iter_mut()
            .find(|s| s.id == source.id)
            .ok_or(SourceRepositoryError::NotFound)?;
        *stored = source.clone();
        Ok(())
    }
}

#[async_trait]
impl MangaRepository for MemoryCatalog {
    async fn get_manga_by_slug(
        &self,
        source_id: i64,
        slug: &str,
    ) -> Result<Option<Manga>, MangaRepositoryError> {
        Ok(self.manga_by_slug(source_id, slug))
    }

    async fn insert_manga(&self, manga: &mut Manga) -> Result<(), MangaRepositoryError> {
        let mut state = self.state.lock().unwrap();
        manga.id = state.next_id();
        state.manga.push(Manga {
            tags: vec![],
            ..manga.clone()
        });
        Ok(())
    }

    async fn update_manga(&self, manga: &Manga) -> Result<(), MangaRepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_manga_updates {
            return Err(MangaRepositoryError::DbError(sqlx::Error::PoolTimedOut));
        }
        let stored = state
            .manga
            .iter_mut()
            .find(|m| m.id == manga.id)
            .ok_or(MangaRepositoryError::NotFound)?;
        *stored = Manga {
            tags: vec![],
            ..manga.clone()
        };
        Ok(())
    }
}

#[async_trait]
impl ChapterRepository for MemoryCatalog {
    async fn insert_chapter(&self, chapter: &mut Chapter) -> Result<(), ChapterRepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_chapter_inserts {
            return Err(ChapterRepositoryError::DbError(sqlx::Error::PoolTimedOut));
        }
        if let Some(existing) = state
            .chapters
            .iter()
            .find(|c| c.manga_id == chapter.manga_id && c.number == chapter.number)
        {
            chapter.id = existing.id;
            return Ok(());
        }
        chapter.id = state.next_id();
        state.chapters.push(chapter.clone());
        Ok(())
    }

    async fn get_chapters_by_manga_id(
        &self,
        manga_id: i64,
    ) -> Result<Vec<Chapter>, ChapterRepositoryError> {
        Ok(self.chapters_of(manga_id))
    }
}

#[async_trait]
impl TagRepository for MemoryCatalog {
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, TagRepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(tag) = state.tags.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn add_tag_to_manga(&self, manga_id: i64, name: &str) -> Result<(), TagRepositoryError> {
        if self.state.lock().unwrap().failing_tags.iter().any(|t| t == name) {
            return Err(TagRepositoryError::DbError(sqlx::Error::PoolTimedOut));
        }
        let tag = self.find_or_create_tag(name).await?;
        let mut state = self.state.lock().unwrap();
        if !state.manga_tags.contains(&(manga_id, tag.id)) {
            state.manga_tags.push((manga_id, tag.id));
        }
        Ok(())
    }
}

/// Serves canned results. A slug without a scripted detail answers 404.
pub struct FakeScraper {
    base_url: String,
    updates: Vec<LatestUpdate>,
    details: HashMap<String, MangaDetail>,
    chapters: HashMap<String, Vec<ChapterListing>>,
    fail_feed: bool,
    delay: Option<Duration>,
    feed_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeScraper {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            updates: vec![],
            details: HashMap::new(),
            chapters: HashMap::new(),
            fail_feed: false,
            delay: None,
            feed_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_updates(mut self, updates: Vec<LatestUpdate>) -> Self {
        self.updates = updates;
        self
    }

    pub fn with_detail(mut self, slug: &str, detail: MangaDetail) -> Self {
        self.details.insert(slug.to_string(), detail);
        self
    }

    pub fn with_chapters(mut self, slug: &str, chapters: Vec<ChapterListing>) -> Self {
        self.chapters.insert(slug.to_string(), chapters);
        self
    }

    pub fn failing_feed(mut self) -> Self {
        self.fail_feed = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_latest_updates(&self) -> ScraperResult<Vec<LatestUpdate>> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_feed {
            return Err(Error::fetch(&self.base_url, "connection refused"));
        }
        Ok(self.updates.clone())
    }

    async fn get_manga_detail(&self, slug: &str) -> ScraperResult<MangaDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details.get(slug).cloned().ok_or_else(|| Error::Status {
            url: format!("{}/manga/{slug}/", self.base_url),
            status: 404,
        })
    }

    async fn get_chapter_list(&self, slug: &str) -> ScraperResult<Vec<ChapterListing>> {
        Ok(self.chapters.get(slug).cloned().unwrap_or_default())
    }
}

/// Records `(manga id, stored chapter count)` at the time of each call.
pub struct RecordingNotifier {
    catalog: MemoryCatalog,
    events: Mutex<Vec<(i64, usize)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new(catalog: MemoryCatalog) -> Self {
        Self {
            catalog,
            events: Mutex::new(vec![]),
            fail: false,
        }
    }

    pub fn failing(self) -> Self {
        Self { fail: true, ..self }
    }

    pub fn events(&self) -> Vec<(i64, usize)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateNotifier for RecordingNotifier {
    async fn notify_entry_updated(&self, manga: &Manga) -> Result<(), anyhow::Error> {
        let stored = self.catalog.chapters_of(manga.id).len();
        self.events.lock().unwrap().push((manga.id, stored));
        if self.fail {
            anyhow::bail!("push service unavailable");
        }
        Ok(())
    }
}

pub fn detail(title: &str, tags: &[&str]) -> MangaDetail {
    MangaDetail {
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

pub fn update(slug: &str, chapter: &str, updated: &str) -> LatestUpdate {
    LatestUpdate {
        title: slug.to_string(),
        slug: slug.to_string(),
        chapter: chapter.to_string(),
        updated: updated.to_string(),
    }
}
