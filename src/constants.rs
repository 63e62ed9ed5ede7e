//! Constants for the touslesfestivals.com source.

/// Tag identifying this source on every integration record
pub const SOURCE_TAG: &str = "touslesfestivals";

pub const DEFAULT_BASE_URL: &str = "https://www.touslesfestivals.com";

/// Path of the paginated agenda, the page index is passed as `?page=`
pub const LISTING_PATH: &str = "/agenda/liste";

/// Anchor class repeated once per festival on a listing page
pub const DETAIL_LINK_SELECTOR: &str = ".agenda-full-link";

/// Element carrying the embedded JSON-LD block on a detail page
pub const STRUCTURED_DATA_SELECTOR: &str = "script[type*=application]";

/// Sub-events whose status does not contain this token are flagged unavailable
pub const SCHEDULED_STATUS_TOKEN: &str = "EventScheduled";

/// The source never states how long a sub-event lasts
pub const SUB_EVENT_DURATION_HOURS: i64 = 4;

pub const DEFAULT_DESCRIPTION_LEAD_IN: &str = "Retrieve the artists:";

pub const ACCEPT_ENCODING_ANY: &str = "*";

/// Mobile agent accepted by edge proxies that reject default clients
pub const ALTERNATE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Mobile Safari/537.36";

pub const DEFAULT_MAX_PAGES: u32 = 500;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BATCH_DEADLINE_SECS: u64 = 300;
pub const DEFAULT_OUTPUT_PATH: &str = "output/festivals.jsonl";

/// Build the listing URL for a given page index
pub fn listing_url(base_url: &str, page: u32) -> String {
    format!("{}{}?page={}", base_url.trim_end_matches('/'), LISTING_PATH, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url("https://www.touslesfestivals.com", 3),
            "https://www.touslesfestivals.com/agenda/liste?page=3"
        );
        assert_eq!(
            listing_url("http://localhost:8080/", 1),
            "http://localhost:8080/agenda/liste?page=1"
        );
    }
}
