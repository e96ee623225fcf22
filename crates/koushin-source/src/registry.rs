use std::{collections::HashMap, sync::Arc};

use koushin_lib::prelude::Scraper;

/// Lowercased, trimmed and without trailing slashes, so
/// `https://www.MangaRead.org/` and `https://www.mangaread.org` collide.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// Adapters keyed by base address. Built once at startup and only read
/// afterwards, share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    scrapers: HashMap<String, Arc<dyn Scraper>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scraper: Arc<dyn Scraper>) -> Self {
        self.insert(scraper);
        self
    }

    /// Returns the adapter previously registered under the same base address.
    pub fn insert(&mut self, scraper: Arc<dyn Scraper>) -> Option<Arc<dyn Scraper>> {
        let key = normalize_base_url(scraper.base_url());
        let previous = self.scrapers.insert(key.clone(), scraper);
        if previous.is_some() {
            warn!("adapter for {key} replaced");
        }
        previous
    }

    pub fn get(&self, base_url: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(&normalize_base_url(base_url)).cloned()
    }

    pub fn contains(&self, base_url: &str) -> bool {
        self.scrapers.contains_key(&normalize_base_url(base_url))
    }

    pub fn list(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.scrapers.keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}
