use crate::app::ports::{Clock, HttpClientPort, IntegrationSink};
use crate::config::CrawlerConfig;
use crate::constants::{listing_url, SOURCE_TAG};
use crate::domain::IntegrationRecord;
use crate::error::CrawlerError;
use crate::metrics::CrawlMetrics;
use crate::scrapers::batch::DetailBatchFetcher;
use crate::scrapers::fetcher::{FetchedPage, PageFetcher};
use crate::scrapers::touslesfestivals::listing::{extract_detail_links, has_more_links};
use crate::scrapers::touslesfestivals::normalizer::FestivalNormalizer;
use crate::scrapers::touslesfestivals::parser::StructuredRecordParser;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A listing page had no detail links
    ListingExhausted,
    /// A listing page could not be retrieved
    ListingUnavailable,
    /// `max_pages` listing pages were processed
    PageCeiling,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub run_id: Uuid,
    pub pages_visited: u32,
    pub records_emitted: usize,
    pub transport_failures: usize,
    pub malformed_records: usize,
    pub discarded_batches: usize,
    pub sink_failures: usize,
    pub stop_reason: Option<StopReason>,
}

impl CrawlReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            pages_visited: 0,
            records_emitted: 0,
            transport_failures: 0,
            malformed_records: 0,
            discarded_batches: 0,
            sink_failures: 0,
            stop_reason: None,
        }
    }
}

/// Walks the paginated agenda until a listing page has no detail links.
pub struct FestivalCrawler {
    fetcher: Arc<PageFetcher>,
    details: DetailBatchFetcher<StructuredRecordParser>,
    normalizer: FestivalNormalizer,
    sink: Arc<dyn IntegrationSink>,
    base_url: String,
    start_page: u32,
    max_pages: u32,
    use_alternate_agent: bool,
}

impl FestivalCrawler {
    pub fn new(
        config: &CrawlerConfig,
        http: Arc<dyn HttpClientPort>,
        sink: Arc<dyn IntegrationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fetcher = Arc::new(
            PageFetcher::new(http)
                .with_request_timeout(config.request_timeout())
                .with_alternate_user_agent(config.alternate_user_agent.clone()),
        );
        let details = DetailBatchFetcher::new(fetcher.clone(), StructuredRecordParser::new())
            .with_concurrency(config.concurrency)
            .with_batch_deadline(config.batch_deadline())
            .with_policy(config.batch_policy)
            .with_alternate_agent(config.use_alternate_agent);
        let normalizer = FestivalNormalizer::new(clock).with_lead_in(config.description_lead_in.clone());

        Self {
            fetcher,
            details,
            normalizer,
            sink,
            base_url: config.base_url.clone(),
            start_page: config.start_page,
            max_pages: config.max_pages,
            use_alternate_agent: config.use_alternate_agent,
        }
    }

    /// Crawl to completion. Failures are logged and counted in the report,
    /// never returned.
    pub async fn run(&self) -> CrawlReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("crawl", %run_id, source = SOURCE_TAG);
        self.crawl(run_id).instrument(span).await
    }

    async fn crawl(&self, run_id: Uuid) -> CrawlReport {
        let mut report = CrawlReport::new(run_id);
        let mut page = self.start_page;
        info!("Starting crawl at page {}", page);

        loop {
            if report.pages_visited >= self.max_pages {
                warn!("Reached the {} page ceiling, stopping", self.max_pages);
                report.stop_reason = Some(StopReason::PageCeiling);
                break;
            }

            let url = listing_url(&self.base_url, page);
            let links = match self.fetcher.fetch(&url, self.use_alternate_agent).await {
                Some(listing) => next_detail_links(&listing),
                None => {
                    warn!("Listing page {} unavailable, stopping", page);
                    report.stop_reason = Some(StopReason::ListingUnavailable);
                    break;
                }
            };

            if links.is_empty() {
                info!("No festivals on page {}, agenda exhausted", page);
                report.stop_reason = Some(StopReason::ListingExhausted);
                break;
            }

            report.pages_visited += 1;
            CrawlMetrics::record_listing_page();

            let span = info_span!("listing_page", page, links = links.len());
            self.process_page(&links, &mut report).instrument(span).await;
            page = match page.checked_add(1) {
                Some(next) => next,
                None => {
                    warn!("Listing page index overflowed after page {}, stopping", page);
                    report.stop_reason = Some(StopReason::PageCeiling);
                    break;
                }
            };
        }

        info!(
            "Crawl finished: {} pages, {} records, {} transport failures, {} malformed, {} discarded batches",
            report.pages_visited,
            report.records_emitted,
            report.transport_failures,
            report.malformed_records,
            report.discarded_batches
        );
        report
    }

    async fn process_page(&self, links: &[String], report: &mut CrawlReport) {
        let records = match self.collect_records(links, report).await {
            Some(records) => records,
            None => return,
        };
        if records.is_empty() {
            return;
        }

        let count = records.len();
        match self.sink.integrate(records).await {
            Ok(()) => {
                report.records_emitted += count;
                CrawlMetrics::record_records_emitted(count);
                info!("Handed {} records to the {} sink", count, self.sink.name());
            }
            Err(e) => {
                report.sink_failures += 1;
                error!("Sink {} rejected {} records: {}", self.sink.name(), count, e);
            }
        }
    }

    /// `None` when the batch was discarded
    async fn collect_records(
        &self,
        links: &[String],
        report: &mut CrawlReport,
    ) -> Option<Vec<IntegrationRecord>> {
        let started = Instant::now();
        let result = self.details.fetch_all(links).await;
        CrawlMetrics::record_batch_duration(started.elapsed().as_secs_f64());

        match result {
            Ok(batch) => {
                report.transport_failures += batch.transport_failures;
                report.malformed_records += batch.malformed;
                CrawlMetrics::record_transport_failures(batch.transport_failures);
                CrawlMetrics::record_malformed_records(batch.malformed);
                Some(
                    batch
                        .records
                        .iter()
                        .map(|(record, url)| self.normalizer.normalize(record, url))
                        .collect(),
                )
            }
            Err(e) => {
                if matches!(e, CrawlerError::MalformedRecord { .. }) {
                    report.malformed_records += 1;
                    CrawlMetrics::record_malformed_records(1);
                }
                report.discarded_batches += 1;
                CrawlMetrics::record_batch_discarded();
                error!("Integration of {} failed with error: {}", SOURCE_TAG, e);
                None
            }
        }
    }
}

fn next_detail_links(listing: &FetchedPage) -> Vec<String> {
    if !has_more_links(&listing.document) {
        return Vec::new();
    }
    extract_detail_links(&listing.document, &listing.url)
}
