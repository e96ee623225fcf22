use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Message, Notifier};

const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
struct Payload {
    // application api token
    token: String,
    // user or group key
    user: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url_title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Response {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Pushover {
    client: reqwest::Client,
    token: String,
}

impl Pushover {
    pub fn new(token: String) -> Pushover {
        let client = reqwest::Client::new();
        Pushover { client, token }
    }

    fn payload(&self, user_key: &str, message: &Message) -> Payload {
        Payload {
            token: self.token.clone(),
            user: user_key.to_string(),
            message: message.body.clone(),
            title: message.title.clone(),
            url: message.url.clone(),
            url_title: message.url_title.clone(),
        }
    }
}

#[async_trait]
impl Notifier for Pushover {
    fn name(&self) -> &'static str {
        "pushover"
    }

    async fn send(&self, user_key: &str, message: &Message) -> Result<(), anyhow::Error> {
        let res: Response = self
            .client
            .post(PUSHOVER_ENDPOINT)
            .json(&self.payload(user_key, message))
            .send()
            .await?
            .json()
            .await?;

        if res.status != 1 {
            return Err(anyhow!(
                "pushover rejected message: status {} {}",
                res.status,
                res.errors.join(", ")
            ));
        }

        Ok(())
    }
}
