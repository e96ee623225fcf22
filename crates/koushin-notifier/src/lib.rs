#[macro_use]
extern crate log;

pub mod gotify;
pub mod pushover;

use async_trait::async_trait;

/// A push message, optionally with a title and a link to open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub title: Option<String>,
    pub body: String,
    pub url: Option<String>,
    pub url_title: Option<String>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    pub fn url(self, url: impl Into<String>, url_title: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            url_title: Some(url_title.into()),
            ..self
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// `recipient` is the backend specific address: a pushover user key or a
    /// gotify application token.
    async fn send(&self, recipient: &str, message: &Message) -> Result<(), anyhow::Error>;
}
