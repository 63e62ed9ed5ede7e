//! touslesfestivals.com agenda.
//!
//! Listing pages at `/agenda/liste?page=N` link to one detail page per
//! festival; each detail page embeds the festival as JSON-LD.

pub mod crawler;
pub mod listing;
pub mod normalizer;
pub mod parser;

pub use crawler::{CrawlReport, FestivalCrawler, StopReason};
pub use normalizer::FestivalNormalizer;
pub use parser::{FestivalRecord, StructuredRecordParser};
