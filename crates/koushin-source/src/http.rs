use std::time::Duration;

use koushin_lib::prelude::{Error, Result};
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("koushin/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Every request made through this client is bounded by `config.timeout`.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::fetch("client", e))
}

/// GET `url` and return the body, treating non-2xx as a fetch failure.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    debug!("GET {url}");

    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::fetch(url, e))?;

    let status = res.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    res.text().await.map_err(|e| Error::fetch(url, e))
}

/// Anything without a single tag cannot be the page we asked for.
pub fn ensure_markup(url: &str, body: &str) -> Result<()> {
    if body.trim_start().starts_with('<') || body.contains("<html") || body.contains("<div") {
        Ok(())
    } else {
        Err(Error::parse(url, "response is not html"))
    }
}
