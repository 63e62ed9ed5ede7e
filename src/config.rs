use crate::constants::{
    ALTERNATE_USER_AGENT, DEFAULT_BASE_URL, DEFAULT_BATCH_DEADLINE_SECS, DEFAULT_CONCURRENCY,
    DEFAULT_DESCRIPTION_LEAD_IN, DEFAULT_MAX_PAGES, DEFAULT_OUTPUT_PATH,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{CrawlerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_PATH_ENV: &str = "FESTIVAL_CRAWLER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// What happens to a listing page's batch when one detail page carries a
/// malformed structured record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// One malformed record discards every record of the page
    #[default]
    Strict,
    /// Malformed records are dropped individually
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Log,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub start_page: u32,
    pub max_pages: u32,
    pub concurrency: usize,
    /// Per-request timeout, 0 disables it
    pub request_timeout_secs: u64,
    /// Deadline for a whole detail batch, 0 disables it
    pub batch_deadline_secs: u64,
    pub batch_policy: BatchPolicy,
    pub use_alternate_agent: bool,
    pub alternate_user_agent: String,
    pub description_lead_in: String,
    pub sink: SinkKind,
    pub output_path: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            start_page: 1,
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            batch_deadline_secs: DEFAULT_BATCH_DEADLINE_SECS,
            batch_policy: BatchPolicy::Strict,
            use_alternate_agent: false,
            alternate_user_agent: ALTERNATE_USER_AGENT.to_string(),
            description_lead_in: DEFAULT_DESCRIPTION_LEAD_IN.to_string(),
            sink: SinkKind::Log,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Read a TOML file, every key is optional
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CrawlerError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: CrawlerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env`, then the file named by `FESTIVAL_CRAWLER_CONFIG` (or
    /// `config.toml` when present), then apply the env overrides.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            info!("Loading crawler config from {}", path);
            Self::load(&path)?
        } else {
            debug!("No config file at {}, using defaults", path);
            Self::default()
        };

        if let Ok(base_url) = std::env::var("FESTIVAL_CRAWLER_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(max_pages) = std::env::var("FESTIVAL_CRAWLER_MAX_PAGES") {
            config.max_pages = max_pages.parse().map_err(|e| {
                CrawlerError::Config(format!("FESTIVAL_CRAWLER_MAX_PAGES '{}': {}", max_pages, e))
            })?;
        }
        if let Ok(concurrency) = std::env::var("FESTIVAL_CRAWLER_CONCURRENCY") {
            config.concurrency = concurrency.parse().map_err(|e| {
                CrawlerError::Config(format!(
                    "FESTIVAL_CRAWLER_CONCURRENCY '{}': {}",
                    concurrency, e
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CrawlerError::Config("concurrency must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(CrawlerError::Config("max_pages must be at least 1".into()));
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            CrawlerError::Config(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }

    pub fn batch_deadline(&self) -> Option<Duration> {
        non_zero_secs(self.batch_deadline_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
