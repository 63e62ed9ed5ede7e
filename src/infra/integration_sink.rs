use crate::app::ports::IntegrationSink;
use crate::domain::IntegrationRecord;
use crate::error::{CrawlerError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Dumps each record as a JSON log line instead of integrating it
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl IntegrationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn integrate(&self, records: Vec<IntegrationRecord>) -> Result<()> {
        for record in &records {
            let json = serde_json::to_string(record)?;
            info!(record = %json, "integration record");
        }
        Ok(())
    }
}

/// Appends one JSON document per line
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IntegrationSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn integrate(&self, records: Vec<IntegrationRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for record in &records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Keeps everything in memory, used by tests and the `fetch` command
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<IntegrationRecord>>,
    batches: Mutex<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<IntegrationRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of `integrate` calls received
    pub fn batches(&self) -> usize {
        self.batches.lock().map(|b| *b).unwrap_or_default()
    }
}

#[async_trait]
impl IntegrationSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn integrate(&self, records: Vec<IntegrationRecord>) -> Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|e| CrawlerError::Sink(e.to_string()))?;
        stored.extend(records);
        let mut batches = self
            .batches
            .lock()
            .map_err(|e| CrawlerError::Sink(e.to_string()))?;
        *batches += 1;
        Ok(())
    }
}
