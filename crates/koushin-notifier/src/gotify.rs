use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{Message, Notifier};

#[derive(Clone)]
pub struct Gotify {
    client: reqwest::Client,
    base_url: String,
}

impl Gotify {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn payload(message: &Message) -> Value {
    let mut payload = json!({ "message": message.body });
    if let Some(title) = &message.title {
        payload["title"] = json!(title);
    }
    if let Some(url) = &message.url {
        payload["extras"] = json!({
            "client::notification": {
                "click": { "url": url }
            }
        });
    }
    payload
}

#[async_trait]
impl Notifier for Gotify {
    fn name(&self) -> &'static str {
        "gotify"
    }

    async fn send(&self, token: &str, message: &Message) -> Result<(), anyhow::Error> {
        self.client
            .post(format!("{}/message", self.base_url))
            .query(&[("token", token)])
            .json(&payload(message))
            .send()
            .await?
            .error_for_status()?;

        debug!("gotify message sent");

        Ok(())
    }
}
