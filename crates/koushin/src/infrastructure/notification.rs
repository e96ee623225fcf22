use std::sync::Arc;

use async_trait::async_trait;
use koushin_notifier::{Message, Notifier, gotify::Gotify, pushover::Pushover};

use crate::domain::{entities::manga::Manga, services::notifier::UpdateNotifier};

struct Target {
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
}

#[derive(Default)]
pub struct Builder {
    targets: Vec<Target>,
    base_url: Option<String>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushover(self, pushover: Pushover, user_keys: Vec<String>) -> Self {
        self.notifier(Arc::new(pushover), user_keys)
    }

    pub fn gotify(self, gotify: Gotify, tokens: Vec<String>) -> Self {
        self.notifier(Arc::new(gotify), tokens)
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>, recipients: Vec<String>) -> Self {
        if recipients.is_empty() {
            warn!("{} has no recipients, ignored", notifier.name());
        } else {
            self.targets.push(Target {
                notifier,
                recipients,
            });
        }
        self
    }

    pub fn base_url(self, base_url: String) -> Self {
        Self {
            base_url: Some(base_url.trim_end_matches('/').to_string()),
            ..self
        }
    }

    pub fn finish(self) -> Notification {
        Notification {
            targets: self.targets,
            base_url: self.base_url,
        }
    }
}

/// Sends a push message for every updated manga to all configured recipients.
pub struct Notification {
    targets: Vec<Target>,
    base_url: Option<String>,
}

impl Notification {
    pub fn message_for(&self, manga: &Manga) -> Message {
        let latest = manga.last_chapter.as_deref().unwrap_or("unknown");
        let message =
            Message::new(format!("New chapter available: {latest}")).title(manga.title.clone());

        match &self.base_url {
            Some(base_url) => message.url(format!("{base_url}/manga/{}", manga.id), "Open"),
            None => message,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl UpdateNotifier for Notification {
    async fn notify_entry_updated(&self, manga: &Manga) -> Result<(), anyhow::Error> {
        let message = self.message_for(manga);

        let mut failed = 0;
        for target in &self.targets {
            for recipient in &target.recipients {
                if let Err(e) = target.notifier.send(recipient, &message).await {
                    error!("failed to send {} notification: {e}", target.notifier.name());
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{failed} notifications for {} not delivered", manga.title);
        }

        Ok(())
    }
}
