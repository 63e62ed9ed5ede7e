use crate::constants::STRUCTURED_DATA_SELECTOR;
use crate::error::{CrawlerError, Result};
use crate::scrapers::batch::DetailParser;
use crate::scrapers::fetcher::FetchedPage;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static STRUCTURED_DATA: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(STRUCTURED_DATA_SELECTOR).expect("structured data selector is valid")
});

/// Festival as published in the detail page's JSON-LD block.
///
/// Every field is optional: missing values surface as nulls in the
/// integration record instead of failing the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FestivalRecord {
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    pub organizer: Option<Organizer>,
    #[serde(deserialize_with = "text")]
    pub event_status: Option<String>,
    #[serde(deserialize_with = "image_url")]
    pub image: Option<String>,
    pub location: Option<Location>,
    #[serde(deserialize_with = "text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub sub_events: Vec<SubEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Organizer {
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    pub address: Option<PostalAddress>,
    #[serde(deserialize_with = "text")]
    pub latitude: Option<String>,
    #[serde(deserialize_with = "text")]
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostalAddress {
    #[serde(deserialize_with = "text")]
    pub street_address: Option<String>,
    #[serde(deserialize_with = "text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "text")]
    pub address_locality: Option<String>,
    #[serde(deserialize_with = "text")]
    pub address_region: Option<String>,
    #[serde(deserialize_with = "text")]
    pub address_country: Option<String>,
}

/// One dated occurrence of a multi-day festival
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubEvent {
    #[serde(deserialize_with = "text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "text")]
    pub event_status: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub performers: Vec<Performer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Performer {
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
}

/// Locates the embedded application-data script and decodes it.
///
/// A missing element or undecodable text is a `MalformedRecord`; the
/// caller decides what happens to the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredRecordParser;

impl StructuredRecordParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_document(&self, document: &Html, url: &str) -> Result<FestivalRecord> {
        let element = document
            .select(&STRUCTURED_DATA)
            .next()
            .ok_or_else(|| CrawlerError::malformed(url, "no embedded application data element"))?;
        let text: String = element.text().collect();

        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| CrawlerError::malformed(url, format!("Failed to parse JSON: {}", e)))?;

        // Some pages wrap the festival in a one-element array
        let value = match value {
            Value::Array(items) => items
                .into_iter()
                .find(Value::is_object)
                .ok_or_else(|| CrawlerError::malformed(url, "structured data array holds no object"))?,
            Value::Object(_) => value,
            other => {
                return Err(CrawlerError::malformed(
                    url,
                    format!("expected a JSON object, found {}", other),
                ))
            }
        };

        serde_json::from_value(value)
            .map_err(|e| CrawlerError::malformed(url, format!("Unexpected record shape: {}", e)))
    }
}

impl DetailParser for StructuredRecordParser {
    type Record = FestivalRecord;

    fn parse(&self, page: &FetchedPage) -> Result<FestivalRecord> {
        self.parse_document(&page.document, &page.url)
    }
}

/// Strings, numbers and `{ "name": ... }` objects all read as text
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(value_text(&Value::deserialize(deserializer)?))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("name").and_then(value_text),
        Value::Array(items) => items.first().and_then(value_text),
        Value::Null => None,
    }
}

/// `image` is a URL, a list of URLs or an `ImageObject`
fn image_url<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    fn pick(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.iter().find_map(pick),
            Value::Object(map) => map.get("url").or_else(|| map.get("contentUrl")).and_then(pick),
            _ => None,
        }
    }
    Ok(pick(&Value::deserialize(deserializer)?))
}

/// `null`, a single object or a list of objects
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
        .collect()
}
