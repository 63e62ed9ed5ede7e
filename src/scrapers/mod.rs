pub mod batch;
pub mod fetcher;
pub mod touslesfestivals;

pub use batch::{DetailBatch, DetailBatchFetcher, DetailParser};
pub use fetcher::{FetchedPage, PageFetcher};
