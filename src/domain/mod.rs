//! Canonical integration records handed to the ingestion pipeline.
//!
//! Field names serialize in camelCase, the shape the ingestion side expects.

pub mod category;

pub use category::Category;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRecord {
    pub event: EventIntegration,
    pub address: AddressIntegration,
    pub place: PlaceIntegration,
    pub place_link: Option<String>,
    pub categories: BTreeSet<Category>,
    /// Never empty
    pub occurrences: Vec<OccurrenceIntegration>,
    pub event_link: EventLinkIntegration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIntegration {
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_date_is_not_reliable: bool,
    pub is_certified: bool,
    pub lower_price: Option<f64>,
    pub upper_price: Option<f64>,
    pub description: String,
    pub participants_number: Option<u32>,
    pub image: Option<String>,
    pub source: String,
    pub search_info: Vec<String>,
    pub only_link_matching: bool,
    pub cant_retrieve_occurrences: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIntegration {
    /// `[longitude, latitude]`, NaN when the source text was not numeric
    pub coordinates: [f64; 2],
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceIntegration {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceIntegration {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub end_date_is_not_reliable: bool,
    /// Set when the occurrence was cancelled or postponed
    pub not_available: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLinkIntegration {
    pub link: String,
    pub bookable: bool,
}
