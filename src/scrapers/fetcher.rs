use crate::app::ports::HttpClientPort;
use crate::constants::{ACCEPT_ENCODING_ANY, ALTERNATE_USER_AGENT};
use crate::error::{CrawlerError, Result};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A page that was retrieved and parsed into a document tree
pub struct FetchedPage {
    pub document: Html,
    pub url: String,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, body: &str) -> Self {
        Self {
            // html5ever collects parse errors on the document instead of reporting them
            document: Html::parse_document(body),
            url: url.into(),
        }
    }
}

/// Retrieves single pages. Failures never escape: they are logged and
/// reported as `None`.
pub struct PageFetcher {
    http: Arc<dyn HttpClientPort>,
    request_timeout: Option<Duration>,
    alternate_user_agent: String,
}

impl PageFetcher {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            request_timeout: None,
            alternate_user_agent: ALTERNATE_USER_AGENT.to_string(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_alternate_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.alternate_user_agent = user_agent.into();
        self
    }

    /// `use_alternate_agent` swaps in a mobile browser user-agent for sites
    /// sitting behind proxies that reject unknown clients.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str, use_alternate_agent: bool) -> Option<FetchedPage> {
        debug!("Getting data for {}...", url);
        match self.fetch_body(url, use_alternate_agent).await {
            Ok(body) => Some(FetchedPage::new(url, &body)),
            Err(e) => {
                warn!("Not able to retrieve url: {}. Error: {}", url, e);
                None
            }
        }
    }

    async fn fetch_body(&self, url: &str, use_alternate_agent: bool) -> Result<String> {
        let mut headers = vec![("Accept-Encoding", ACCEPT_ENCODING_ANY)];
        if use_alternate_agent {
            headers.push(("User-Agent", self.alternate_user_agent.as_str()));
        }

        let request = self.http.get(url, &headers);
        let response = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| transport_error(url, format!("timed out after {:?}", limit)))?,
            None => request.await,
        }
        .map_err(|message| transport_error(url, message))?;

        if !response.is_success() {
            return Err(transport_error(
                url,
                format!("request failed with status: {}", response.status),
            ));
        }

        Ok(String::from_utf8_lossy(&response.bytes).into_owned())
    }
}

fn transport_error(url: &str, message: impl Into<String>) -> CrawlerError {
    CrawlerError::Transport {
        url: url.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every request with the same result and records the headers sent
    struct StubHttp {
        result: std::result::Result<HttpGetResult, String>,
        delay: Option<Duration>,
        seen_headers: Mutex<Vec<(String, String)>>,
    }

    impl StubHttp {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                result: Ok(HttpGetResult {
                    status,
                    bytes: body.as_bytes().to_vec(),
                }),
                delay: None,
                seen_headers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClientPort for StubHttp {
        async fn get(&self, _url: &str, headers: &[(&str, &str)]) -> std::result::Result<HttpGetResult, String> {
            {
                let mut seen = self.seen_headers.lock().unwrap();
                seen.extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn test_fetch_parses_document() {
        let http = Arc::new(StubHttp::ok(200, "<html><body><h1>Hello</h1></body></html>"));
        let fetcher = PageFetcher::new(http);
        let page = fetcher.fetch("https://example.com/a", false).await.unwrap();
        assert_eq!(page.url, "https://example.com/a");
        let h1 = scraper::Selector::parse("h1").unwrap();
        let text: String = page.document.select(&h1).next().unwrap().text().collect();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_default_headers_only_accept_encoding() {
        let http = Arc::new(StubHttp::ok(200, "<html></html>"));
        let fetcher = PageFetcher::new(http.clone());
        fetcher.fetch("https://example.com", false).await.unwrap();
        let seen = http.seen_headers.lock().unwrap().clone();
        assert_eq!(seen, vec![("Accept-Encoding".to_string(), "*".to_string())]);
    }

    #[tokio::test]
    async fn test_alternate_agent_header() {
        let http = Arc::new(StubHttp::ok(200, "<html></html>"));
        let fetcher = PageFetcher::new(http.clone()).with_alternate_user_agent("TestAgent/1.0");
        fetcher.fetch("https://example.com", true).await.unwrap();
        let seen = http.seen_headers.lock().unwrap().clone();
        assert!(seen.contains(&("User-Agent".to_string(), "TestAgent/1.0".to_string())));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_none() {
        let http = Arc::new(StubHttp {
            result: Err("connection refused".into()),
            delay: None,
            seen_headers: Mutex::new(Vec::new()),
        });
        let fetcher = PageFetcher::new(http);
        assert!(fetcher.fetch("https://example.com", false).await.is_none());
    }

    #[tokio::test]
    async fn test_error_status_becomes_none() {
        let http = Arc::new(StubHttp::ok(503, "<html>busy</html>"));
        let fetcher = PageFetcher::new(http);
        assert!(fetcher.fetch("https://example.com", false).await.is_none());
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let mut stub = StubHttp::ok(200, "<html></html>");
        stub.delay = Some(Duration::from_secs(5));
        let fetcher = PageFetcher::new(Arc::new(stub)).with_request_timeout(Some(Duration::from_millis(20)));
        assert!(fetcher.fetch("https://example.com", false).await.is_none());
    }
}
