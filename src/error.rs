use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to retrieve {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Malformed structured record at {url}: {reason}")]
    MalformedRecord { url: String, reason: String },

    #[error("Detail batch did not settle within {deadline:?}")]
    BatchDeadline { deadline: std::time::Duration },

    #[error("Integration sink error: {0}")]
    Sink(String),
}

impl CrawlerError {
    pub fn malformed(url: &str, reason: impl Into<String>) -> Self {
        CrawlerError::MalformedRecord {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlerError>;
