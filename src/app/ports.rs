use crate::domain::IntegrationRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Raw HTTP transport. Implementations report failures as plain strings,
/// the page fetcher decides what to do with them.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> std::result::Result<HttpGetResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Consumer of normalized records (the ingestion pipeline)
#[async_trait]
pub trait IntegrationSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn integrate(&self, records: Vec<IntegrationRecord>) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
