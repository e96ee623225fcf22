use std::{fmt::Display, sync::Arc};

use tokio::{
    sync::{broadcast, oneshot, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

pub use crate::domain::services::reconcile::ChapterUpdate;
use crate::domain::{
    repositories::{
        chapter::ChapterRepository, manga::MangaRepository, source::SourceRepository,
        tag::TagRepository,
    },
    services::update::{PollSummary, UpdateError, UpdateService},
};

pub type ChapterUpdateReceiver = broadcast::Receiver<ChapterUpdate>;
pub type ChapterUpdateSender = broadcast::Sender<ChapterUpdate>;

pub type PollResult = Result<PollSummary, UpdateError>;

pub enum UpdateCommand {
    All(oneshot::Sender<PollResult>),
    Source(i64, oneshot::Sender<PollResult>),
}

impl Display for UpdateCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateCommand::All(_) => write!(f, "UpdateCommand::All"),
            UpdateCommand::Source(id, _) => write!(f, "UpdateCommand::Source({id})"),
        }
    }
}

pub type UpdateCommandReceiver = flume::Receiver<UpdateCommand>;
pub type UpdateCommandSender = flume::Sender<UpdateCommand>;

struct UpdatesWorker<S, M, C, T>
where
    S: SourceRepository + 'static,
    M: MangaRepository + 'static,
    C: ChapterRepository + 'static,
    T: TagRepository + 'static,
{
    period: u64,
    service: Arc<UpdateService<S, M, C, T>>,
    broadcast_tx: ChapterUpdateSender,
    command_rx: UpdateCommandReceiver,
    shutdown: watch::Receiver<bool>,
}

impl<S, M, C, T> UpdatesWorker<S, M, C, T>
where
    S: SourceRepository + 'static,
    M: MangaRepository + 'static,
    C: ChapterRepository + 'static,
    T: TagRepository + 'static,
{
    fn new(
        period: u64,
        service: Arc<UpdateService<S, M, C, T>>,
        broadcast_tx: ChapterUpdateSender,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, UpdateCommandSender) {
        #[cfg(not(debug_assertions))]
        let period = if period > 0 && period < 3600 {
            3600
        } else {
            period
        };
        if period == 0 {
            info!("periodic updates disabled");
        } else {
            info!("periodic updates every {} seconds", period);
        }

        let (command_tx, command_rx) = flume::bounded(0);

        (
            Self {
                period,
                service,
                broadcast_tx,
                command_rx,
                shutdown,
            },
            command_tx,
        )
    }

    fn publish(&self, summary: &PollSummary) {
        for update in &summary.updates {
            if let Err(e) = self.broadcast_tx.send(update.clone()) {
                debug!("no subscriber for chapter update: {e}");
            }
        }
    }

    fn report(&self, res: &PollResult) {
        match res {
            Ok(summary) => {
                self.publish(summary);
                info!(
                    "polled {} sources, {} idle, {} failed, {} new chapters",
                    summary.polled,
                    summary.idle,
                    summary.failed,
                    summary.updates.len()
                );
            }
            Err(e) => {
                if let Some(summary) = e.partial_summary() {
                    self.publish(summary);
                }
                error!("failed poll updates: {e}");
            }
        }
    }

    async fn run(mut self) {
        let period = if self.period == 0 { 3600 } else { self.period };
        let mut update_interval = time::interval(time::Duration::from_secs(period));
        update_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                Ok(cmd) = self.command_rx.recv_async() => {
                    info!("received command: {cmd}");
                    match cmd {
                        UpdateCommand::All(tx) => {
                            let res = self.service.run_poll_cycle_until(&self.shutdown).await;
                            self.report(&res);
                            if tx.send(res).is_err() {
                                info!("failed to send poll result");
                            }
                        }
                        UpdateCommand::Source(source_id, tx) => {
                            let res = self.service.poll_source_by_id(source_id).await;
                            self.report(&res);
                            if tx.send(res).is_err() {
                                info!("failed to send poll result");
                            }
                        }
                    }
                }
                start = update_interval.tick() => {
                    if self.period == 0 {
                        continue;
                    }

                    info!("start periodic updates");

                    let res = self.service.run_poll_cycle_until(&self.shutdown).await;
                    self.report(&res);

                    info!("periodic updates done in {:?}", Instant::now() - start);
                }
                res = self.shutdown.changed() => {
                    if res.is_err() || *self.shutdown.borrow() {
                        info!("updates worker stopped");
                        break;
                    }
                }
            }
        }
    }
}

/// Spawns the periodic poller. Sending `true` on `shutdown`, or dropping its
/// sender, stops the worker after the source being polled.
pub fn start<S, M, C, T>(
    period: u64,
    service: Arc<UpdateService<S, M, C, T>>,
    shutdown: watch::Receiver<bool>,
) -> (ChapterUpdateReceiver, UpdateCommandSender, JoinHandle<()>)
where
    S: SourceRepository + 'static,
    M: MangaRepository + 'static,
    C: ChapterRepository + 'static,
    T: TagRepository + 'static,
{
    let (broadcast_tx, broadcast_rx) = broadcast::channel(10);
    let (worker, command_tx) = UpdatesWorker::new(period, service, broadcast_tx, shutdown);

    let handle = tokio::spawn(worker.run());

    (broadcast_rx, command_tx, handle)
}
