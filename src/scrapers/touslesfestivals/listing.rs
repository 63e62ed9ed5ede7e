use crate::constants::DETAIL_LINK_SELECTOR;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;

static DETAIL_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(DETAIL_LINK_SELECTOR).expect("detail link selector is valid"));

/// Whether a listing page still enumerates festivals.
///
/// A page with no detail-link element at all and a page whose elements
/// carry no usable href both mean the agenda is exhausted; callers should
/// rely on `extract_detail_links` returning an empty list for the latter.
pub fn has_more_links(document: &Html) -> bool {
    document.select(&DETAIL_LINK).next().is_some()
}

/// Absolute, de-duplicated detail page URLs in document order.
/// Relative hrefs are resolved against `page_url`.
pub fn extract_detail_links(document: &Html, page_url: &str) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let mut seen = HashSet::new();

    document
        .select(&DETAIL_LINK)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| resolve(base.as_ref(), href))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    Some(url.into())
}
