//! Crawl metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! macros are no-ops, so library users pay nothing unless they opt in.

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Naming convention: festival_{name}_total for counters, festival_{name} otherwise
macro_rules! crawl_metric {
    (counter, $name:literal) => {
        concat!("festival_", $name, "_total")
    };
    (histogram, $name:literal) => {
        concat!("festival_", $name)
    };
}

/// Install a Prometheus exporter when `PROMETHEUS_ADDR` is set.
///
/// Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        let addr_str = match std::env::var("PROMETHEUS_ADDR") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => return,
        };
        let addr: SocketAddr = match addr_str.parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Invalid PROMETHEUS_ADDR '{}': {}", addr_str, e);
                return;
            }
        };
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        match builder.install() {
            Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
            Err(e) => warn!("Prometheus exporter install failed: {}", e),
        }
    });
}

pub struct CrawlMetrics;

impl CrawlMetrics {
    pub fn record_listing_page() {
        ::metrics::counter!(crawl_metric!(counter, "listing_pages")).increment(1);
    }

    pub fn record_transport_failures(count: usize) {
        ::metrics::counter!(crawl_metric!(counter, "detail_fetch_errors")).increment(count as u64);
    }

    pub fn record_malformed_records(count: usize) {
        ::metrics::counter!(crawl_metric!(counter, "malformed_records")).increment(count as u64);
    }

    pub fn record_batch_discarded() {
        ::metrics::counter!(crawl_metric!(counter, "batches_discarded")).increment(1);
    }

    pub fn record_records_emitted(count: usize) {
        ::metrics::counter!(crawl_metric!(counter, "records_emitted")).increment(count as u64);
    }

    pub fn record_batch_duration(duration_secs: f64) {
        ::metrics::histogram!(crawl_metric!(histogram, "batch_duration_seconds")).record(duration_secs);
    }
}
