use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures a source adapter can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("{url} returned http status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },
    #[error("no chapter number in label {0:?}")]
    InvalidChapter(String),
}

impl Error {
    pub fn fetch(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Network failure or a non-2xx response.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Status { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
