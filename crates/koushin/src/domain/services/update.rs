use std::{sync::Arc, time::Duration};

use chrono::Utc;
use koushin_source::registry::SourceRegistry;
use thiserror::Error;
use tokio::sync::{Mutex, watch};

use crate::domain::{
    entities::source::Source,
    repositories::{
        chapter::ChapterRepository,
        manga::MangaRepository,
        source::{SourceRepository, SourceRepositoryError},
        tag::TagRepository,
    },
    services::reconcile::{
        CatalogReconciler, ChapterUpdate, DEFAULT_FETCH_TIMEOUT, ReconcileError, ReconcileOutcome,
        with_timeout,
    },
};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("failed to load sources: {0}")]
    SourceError(#[source] SourceRepositoryError),
    /// Only error a pass stops on once it started polling
    #[error("failed to save last checked of {url}: {source}")]
    CheckpointError {
        url: String,
        #[source]
        source: SourceRepositoryError,
        summary: Box<PollSummary>,
    },
    #[error("another poll pass is running")]
    PassInProgress,
    #[error("poll pass cancelled")]
    Cancelled { summary: Box<PollSummary> },
}

impl UpdateError {
    /// Work committed before the pass stopped.
    pub fn partial_summary(&self) -> Option<&PollSummary> {
        match self {
            Self::CheckpointError { summary, .. } | Self::Cancelled { summary } => Some(&**summary),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct PollSummary {
    /// Sources whose feed was fetched and reconciled
    pub polled: usize,
    /// Sources checked within the poll interval
    pub idle: usize,
    /// Sources without adapter or with a failed feed
    pub failed: usize,
    pub created: usize,
    pub unchanged: usize,
    pub skipped_items: usize,
    pub failed_items: usize,
    pub updates: Vec<ChapterUpdate>,
}

impl PollSummary {
    fn absorb(&mut self, outcome: ReconcileOutcome) {
        self.polled += 1;
        self.created += outcome.created;
        self.unchanged += outcome.unchanged;
        self.skipped_items += outcome.skipped;
        self.failed_items += outcome.failed;
        self.updates.extend(outcome.updates);
    }
}

pub struct UpdateService<S, M, C, T>
where
    S: SourceRepository,
    M: MangaRepository,
    C: ChapterRepository,
    T: TagRepository,
{
    source_repo: S,
    reconciler: CatalogReconciler<M, C, T>,
    registry: Arc<SourceRegistry>,
    poll_interval: chrono::Duration,
    fetch_timeout: Duration,
    pass: Mutex<()>,
}

impl<S, M, C, T> UpdateService<S, M, C, T>
where
    S: SourceRepository,
    M: MangaRepository,
    C: ChapterRepository,
    T: TagRepository,
{
    pub fn new(
        source_repo: S,
        reconciler: CatalogReconciler<M, C, T>,
        registry: Arc<SourceRegistry>,
        poll_interval: chrono::Duration,
    ) -> Self {
        Self {
            source_repo,
            reconciler,
            registry,
            poll_interval,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            pass: Mutex::new(()),
        }
    }

    pub fn with_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    pub async fn run_poll_cycle(&self) -> Result<PollSummary, UpdateError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_poll_cycle_until(&cancel_rx).await
    }

    /// Polls every source not checked within the poll interval. `cancel` is
    /// looked at between sources, a source being polled always finishes.
    pub async fn run_poll_cycle_until(
        &self,
        cancel: &watch::Receiver<bool>,
    ) -> Result<PollSummary, UpdateError> {
        let _pass = self
            .pass
            .try_lock()
            .map_err(|_| UpdateError::PassInProgress)?;

        let sources = self
            .source_repo
            .get_sources()
            .await
            .map_err(UpdateError::SourceError)?;

        let mut summary = PollSummary::default();
        for source in sources {
            if *cancel.borrow() {
                info!("poll pass cancelled");
                return Err(UpdateError::Cancelled {
                    summary: Box::new(summary),
                });
            }

            if !source.is_stale(Utc::now().naive_utc(), self.poll_interval) {
                debug!("{} checked recently, skip", source.url);
                summary.idle += 1;
                continue;
            }

            let url = source.url.clone();
            if let Err(source) = self.poll_source(source, &mut summary).await {
                return Err(UpdateError::CheckpointError {
                    url,
                    source,
                    summary: Box::new(summary),
                });
            }
        }

        Ok(summary)
    }

    /// Polls one source now, regardless of when it was last checked.
    pub async fn poll_source_by_id(&self, source_id: i64) -> Result<PollSummary, UpdateError> {
        let _pass = self
            .pass
            .try_lock()
            .map_err(|_| UpdateError::PassInProgress)?;

        let source = self
            .source_repo
            .get_source_by_id(source_id)
            .await
            .map_err(UpdateError::SourceError)?;

        let url = source.url.clone();
        let mut summary = PollSummary::default();
        match self.poll_source(source, &mut summary).await {
            Ok(()) => Ok(summary),
            Err(source) => Err(UpdateError::CheckpointError {
                url,
                source,
                summary: Box::new(summary),
            }),
        }
    }

    /// Only saving the checkpoint can fail.
    async fn poll_source(
        &self,
        mut source: Source,
        summary: &mut PollSummary,
    ) -> Result<(), SourceRepositoryError> {
        let Some(scraper) = self.registry.get(&source.url) else {
            warn!("no adapter registered for {}, skip", source.url);
            summary.failed += 1;
            return Ok(());
        };

        let updates = match with_timeout(self.fetch_timeout, scraper.get_latest_updates()).await {
            Ok(updates) => updates,
            Err(e) => {
                // last checked stays as is so the next pass retries
                let kind = match &e {
                    ReconcileError::SourceError(e) if e.is_fetch() => "unreachable",
                    ReconcileError::SourceError(e) if e.is_parse() => "unparseable",
                    ReconcileError::Timeout(_) => "timed out",
                    _ => "failed",
                };
                error!("latest updates of {} {kind}, reason: {e}", source.url);
                summary.failed += 1;
                return Ok(());
            }
        };
        debug!("{} lists {} updates", source.name, updates.len());

        let outcome = self
            .reconciler
            .reconcile(&source, scraper.as_ref(), updates)
            .await;
        info!(
            "{}: {} new chapters, {} new manga, {} failed",
            source.name,
            outcome.updates.len(),
            outcome.created,
            outcome.failed
        );
        summary.absorb(outcome);

        source.last_checked = Some(Utc::now().naive_utc());
        self.source_repo.update_source(&source).await
    }
}
