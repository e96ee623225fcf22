use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PushoverConfig {
    pub application_key: String,
    #[serde(default)]
    pub user_keys: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GotifyConfig {
    pub base_url: String,
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_create_database")]
    pub create_database: bool,
    /// Seconds between timer driven passes, 0 disables the timer
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    /// Seconds a source stays fresh after a completed poll
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    pub pushover: Option<PushoverConfig>,
    pub gotify: Option<GotifyConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: koushin_home().join("config.yml"),
            database_path: default_database_path(),
            create_database: default_create_database(),
            update_interval: default_update_interval(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            base_url: None,
            sources: default_sources(),
            pushover: None,
            gotify: None,
        }
    }
}

fn koushin_home() -> PathBuf {
    match std::env::var("KOUSHIN_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".koushin"),
    }
}

fn default_database_path() -> String {
    koushin_home().join("koushin.db").display().to_string()
}

fn default_create_database() -> bool {
    true
}

fn default_update_interval() -> u64 {
    3600
}

fn default_poll_interval() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("koushin/{}", env!("CARGO_PKG_VERSION"))
}

fn default_sources() -> Vec<SourceConfig> {
    vec![SourceConfig {
        url: koushin_source::sources::mangaread::BASE_URL.to_string(),
        name: "MangaRead".to_string(),
    }]
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => koushin_home().join("config.yml"),
        };

        match std::fs::File::open(&config_path) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                Ok(cfg)
            }
        }
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }

    pub fn poll_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.poll_interval as i64)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout)
    }
}
