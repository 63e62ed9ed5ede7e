#![allow(dead_code)]

use async_trait::async_trait;
use festival_crawler::app::ports::{HttpClientPort, HttpGetResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const BASE_URL: &str = "https://festivals.test";

/// Serves canned pages by URL and remembers every request
#[derive(Default)]
pub struct ScriptedHttp {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    pub fn listing(self, page: u32, detail_paths: &[&str]) -> Self {
        self.page(listing_url(page), listing_html(detail_paths))
    }

    pub fn detail(self, path: &str, record: Value) -> Self {
        self.page(format!("{}{}", BASE_URL, path), detail_html(&record.to_string()))
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpGetResult, String> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => Ok(HttpGetResult {
                status: 200,
                bytes: body.as_bytes().to_vec(),
            }),
            None => Err(format!("connection refused: {}", url)),
        }
    }
}

pub fn listing_url(page: u32) -> String {
    format!("{}/agenda/liste?page={}", BASE_URL, page)
}

pub fn listing_html(detail_paths: &[&str]) -> String {
    let links: String = detail_paths
        .iter()
        .map(|path| format!(r#"<a class="agenda-full-link" href="{}">Voir</a>"#, path))
        .collect();
    format!(
        r#"<html><body><div class="agenda-list">{}</div></body></html>"#,
        links
    )
}

pub fn empty_listing_html() -> String {
    r#"<html><body><p class="no-result">Aucun festival ne correspond</p></body></html>"#.to_string()
}

pub fn detail_html(script: &str) -> String {
    format!(
        r#"<html><head><title>Festival</title>
        <style>@import url("broken.css") screen and (</style>
        <script type="application/ld+json">{}</script>
        </head><body><h1>Festival</h1></body></html>"#,
        script
    )
}

pub fn festival_json(name: &str, performers: &[&str]) -> Value {
    let performers: Vec<Value> = performers.iter().map(|p| json!({ "name": p })).collect();
    json!({
        "@context": "https://schema.org",
        "@type": "Festival",
        "name": name,
        "eventStatus": "https://schema.org/EventScheduled",
        "image": format!("https://img.test/{}.jpg", name),
        "location": {
            "name": "Plaine de Rapatel",
            "address": {
                "streetAddress": "",
                "postalCode": "29270",
                "addressLocality": "Carhaix-Plouguer",
                "addressRegion": "Bretagne",
                "addressCountry": "FR"
            },
            "latitude": "48.2757",
            "longitude": "-3.5736"
        },
        "startDate": "2025-07-17T14:00:00+02:00",
        "endDate": "2025-07-20T23:59:00+02:00",
        "subEvents": [
            {
                "startDate": "2025-07-17T18:00:00+02:00",
                "eventStatus": "https://schema.org/EventScheduled",
                "performers": performers
            },
            {
                "startDate": "2025-07-18T18:00:00+02:00",
                "eventStatus": "https://schema.org/EventCancelled",
                "performers": []
            }
        ]
    })
}
