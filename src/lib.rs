pub mod app;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod scrapers;

pub use config::{BatchPolicy, CrawlerConfig, SinkKind};
pub use domain::{Category, IntegrationRecord};
pub use error::{CrawlerError, Result};
pub use scrapers::touslesfestivals::{CrawlReport, FestivalCrawler, StopReason};
