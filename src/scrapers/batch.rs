use crate::config::BatchPolicy;
use crate::error::{CrawlerError, Result};
use crate::scrapers::fetcher::{FetchedPage, PageFetcher};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Source-specific decoding of a detail page
pub trait DetailParser: Send + Sync {
    type Record;

    fn parse(&self, page: &FetchedPage) -> Result<Self::Record>;
}

/// Outcome of one detail batch. Records come back in completion order.
#[derive(Debug)]
pub struct DetailBatch<R> {
    pub records: Vec<(R, String)>,
    pub transport_failures: usize,
    pub malformed: usize,
}

/// Fetches every detail page of a listing page through a bounded
/// concurrency gate, then decodes them.
pub struct DetailBatchFetcher<P> {
    fetcher: Arc<PageFetcher>,
    parser: P,
    concurrency: usize,
    batch_deadline: Option<Duration>,
    policy: BatchPolicy,
    use_alternate_agent: bool,
}

impl<P: DetailParser> DetailBatchFetcher<P> {
    pub fn new(fetcher: Arc<PageFetcher>, parser: P) -> Self {
        Self {
            fetcher,
            parser,
            concurrency: crate::constants::DEFAULT_CONCURRENCY,
            batch_deadline: None,
            policy: BatchPolicy::Strict,
            use_alternate_agent: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_batch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.batch_deadline = deadline;
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_alternate_agent(mut self, use_alternate_agent: bool) -> Self {
        self.use_alternate_agent = use_alternate_agent;
        self
    }

    /// Waits for every fetch to settle. Pages that could not be retrieved
    /// are dropped and counted. Under `BatchPolicy::Strict` the first
    /// malformed record or a missed batch deadline fails the whole batch;
    /// under `BatchPolicy::Lenient` pages still pending at the deadline
    /// count as transport failures.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<DetailBatch<P::Record>> {
        let fetches = stream::iter(urls)
            .map(|url| self.fetcher.fetch(url, self.use_alternate_agent))
            .buffer_unordered(self.concurrency);
        tokio::pin!(fetches);

        let mut pages: Vec<FetchedPage> = Vec::with_capacity(urls.len());
        match self.batch_deadline {
            Some(deadline) => {
                let expired = tokio::time::sleep(deadline);
                tokio::pin!(expired);
                loop {
                    tokio::select! {
                        next = fetches.next() => match next {
                            Some(page) => pages.extend(page),
                            None => break,
                        },
                        _ = &mut expired => {
                            if self.policy == BatchPolicy::Strict {
                                return Err(CrawlerError::BatchDeadline { deadline });
                            }
                            warn!(
                                "Batch deadline of {:?} passed, keeping {} settled pages of {}",
                                deadline,
                                pages.len(),
                                urls.len()
                            );
                            break;
                        }
                    }
                }
            }
            None => {
                while let Some(page) = fetches.next().await {
                    pages.extend(page);
                }
            }
        }

        let mut batch = DetailBatch {
            records: Vec::with_capacity(pages.len()),
            transport_failures: urls.len() - pages.len(),
            malformed: 0,
        };
        debug!(
            "Detail batch settled: {} pages retrieved, {} failed",
            pages.len(),
            batch.transport_failures
        );

        for page in &pages {
            match self.parser.parse(page) {
                Ok(record) => batch.records.push((record, page.url.clone())),
                Err(e) => match self.policy {
                    BatchPolicy::Strict => return Err(e),
                    BatchPolicy::Lenient => {
                        warn!("Dropping {}: {}", page.url, e);
                        batch.malformed += 1;
                    }
                },
            }
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{HttpClientPort, HttpGetResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned bodies by URL, unknown URLs fail at the transport level
    struct PagesHttp {
        pages: HashMap<String, String>,
        delays: HashMap<String, Duration>,
    }

    impl PagesHttp {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                delays: HashMap::new(),
            }
        }

        fn slow(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl HttpClientPort for PagesHttp {
        async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> std::result::Result<HttpGetResult, String> {
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            self.pages
                .get(url)
                .map(|body| HttpGetResult {
                    status: 200,
                    bytes: body.as_bytes().to_vec(),
                })
                .ok_or_else(|| format!("no route to {}", url))
        }
    }

    /// Reads the `<title>` text, pages without one are malformed
    struct TitleParser;

    impl DetailParser for TitleParser {
        type Record = String;

        fn parse(&self, page: &FetchedPage) -> Result<String> {
            let selector = scraper::Selector::parse("title").unwrap();
            page.document
                .select(&selector)
                .next()
                .map(|el| el.text().collect())
                .ok_or_else(|| CrawlerError::malformed(&page.url, "missing title"))
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    fn batch_fetcher(http: PagesHttp) -> DetailBatchFetcher<TitleParser> {
        let fetcher = Arc::new(PageFetcher::new(Arc::new(http)));
        DetailBatchFetcher::new(fetcher, TitleParser).with_concurrency(2)
    }

    #[tokio::test]
    async fn test_transport_failures_are_filtered() {
        let http = PagesHttp::new(&[
            ("https://x.test/a", "<title>A</title>"),
            ("https://x.test/b", "<title>B</title>"),
        ]);
        let batch = batch_fetcher(http)
            .fetch_all(&urls(&["https://x.test/a", "https://x.test/b", "https://x.test/missing"]))
            .await
            .unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.transport_failures, 1);
        let mut titles: Vec<String> = batch.records.into_iter().map(|(t, _)| t).collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_strict_policy_discards_whole_batch() {
        let http = PagesHttp::new(&[
            ("https://x.test/a", "<title>A</title>"),
            ("https://x.test/b", "<p>no title here</p>"),
            ("https://x.test/c", "<title>C</title>"),
        ]);
        let result = batch_fetcher(http)
            .with_policy(BatchPolicy::Strict)
            .fetch_all(&urls(&["https://x.test/a", "https://x.test/b", "https://x.test/c"]))
            .await;

        assert!(matches!(result, Err(CrawlerError::MalformedRecord { .. })));
    }

    #[tokio::test]
    async fn test_lenient_policy_keeps_good_records() {
        let http = PagesHttp::new(&[
            ("https://x.test/a", "<title>A</title>"),
            ("https://x.test/b", "<p>no title here</p>"),
            ("https://x.test/c", "<title>C</title>"),
        ]);
        let batch = batch_fetcher(http)
            .with_policy(BatchPolicy::Lenient)
            .fetch_all(&urls(&["https://x.test/a", "https://x.test/b", "https://x.test/c"]))
            .await
            .unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 1);
        assert_eq!(batch.transport_failures, 0);
    }

    #[tokio::test]
    async fn test_records_keep_their_source_url() {
        let http = PagesHttp::new(&[("https://x.test/a", "<title>A</title>")]);
        let batch = batch_fetcher(http)
            .fetch_all(&urls(&["https://x.test/a"]))
            .await
            .unwrap();
        assert_eq!(batch.records, vec![("A".to_string(), "https://x.test/a".to_string())]);
    }

    #[tokio::test]
    async fn test_batch_deadline() {
        let http = PagesHttp::new(&[("https://x.test/a", "<title>A</title>")])
            .slow("https://x.test/a", Duration::from_secs(5));
        let result = batch_fetcher(http)
            .with_batch_deadline(Some(Duration::from_millis(20)))
            .fetch_all(&urls(&["https://x.test/a"]))
            .await;
        assert!(matches!(result, Err(CrawlerError::BatchDeadline { .. })));
    }

    #[tokio::test]
    async fn test_lenient_deadline_keeps_settled_pages() {
        let http = PagesHttp::new(&[
            ("https://x.test/a", "<title>A</title>"),
            ("https://x.test/b", "<title>B</title>"),
            ("https://x.test/slow", "<title>Slow</title>"),
        ])
        .slow("https://x.test/slow", Duration::from_secs(5));
        let batch = batch_fetcher(http)
            .with_policy(BatchPolicy::Lenient)
            .with_batch_deadline(Some(Duration::from_millis(200)))
            .fetch_all(&urls(&["https://x.test/a", "https://x.test/slow", "https://x.test/b"]))
            .await
            .unwrap();

        let mut titles: Vec<String> = batch.records.into_iter().map(|(t, _)| t).collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(batch.transport_failures, 1);
        assert_eq!(batch.malformed, 0);
    }

    /// Tracks how many requests are open at once
    #[derive(Default)]
    struct InFlightHttp {
        open: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl HttpClientPort for InFlightHttp {
        async fn get(&self, _url: &str, _headers: &[(&str, &str)]) -> std::result::Result<HttpGetResult, String> {
            let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(open, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.open.fetch_sub(1, Ordering::SeqCst);
            Ok(HttpGetResult {
                status: 200,
                bytes: b"<title>T</title>".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn test_concurrency_gate_bounds_open_requests() {
        let http = Arc::new(InFlightHttp::default());
        let fetcher = Arc::new(PageFetcher::new(http.clone()));
        let targets: Vec<String> = (0..20).map(|i| format!("https://x.test/{}", i)).collect();

        let batch = DetailBatchFetcher::new(fetcher, TitleParser)
            .with_concurrency(3)
            .fetch_all(&targets)
            .await
            .unwrap();

        assert_eq!(batch.records.len(), 20);
        assert_eq!(http.peak.load(Ordering::SeqCst), 3);
        assert_eq!(http.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let http = PagesHttp::new(&[]);
        let batch = batch_fetcher(http).fetch_all(&[]).await.unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.transport_failures, 0);
    }
}
