use crate::app::ports::Clock;
use crate::constants::{
    DEFAULT_DESCRIPTION_LEAD_IN, SCHEDULED_STATUS_TOKEN, SOURCE_TAG, SUB_EVENT_DURATION_HOURS,
};
use crate::domain::{
    AddressIntegration, Category, EventIntegration, EventLinkIntegration, IntegrationRecord,
    OccurrenceIntegration, PlaceIntegration,
};
use crate::scrapers::touslesfestivals::parser::{FestivalRecord, SubEvent};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Europe::Paris;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Turns decoded festival records into integration records.
///
/// Never fails: missing or unreadable values become `None` (or NaN for
/// coordinates) in the output.
pub struct FestivalNormalizer {
    clock: Arc<dyn Clock>,
    lead_in: String,
}

impl FestivalNormalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            lead_in: DEFAULT_DESCRIPTION_LEAD_IN.to_string(),
        }
    }

    pub fn with_lead_in(mut self, lead_in: impl Into<String>) -> Self {
        self.lead_in = lead_in.into();
        self
    }

    pub fn normalize(&self, record: &FestivalRecord, source_url: &str) -> IntegrationRecord {
        let performers = collect_performers(record);
        let description = build_description(&self.lead_in, &performers);
        let occurrences = derive_occurrences(record, self.clock.now());

        let location = record.location.clone().unwrap_or_default();
        let postal = location.address.clone().unwrap_or_default();

        IntegrationRecord {
            event: EventIntegration {
                name: record.name.clone(),
                start_date: record.start_date.as_deref().and_then(parse_source_date),
                end_date: record.end_date.as_deref().and_then(parse_source_date),
                end_date_is_not_reliable: true,
                is_certified: true,
                lower_price: None,
                upper_price: None,
                description,
                participants_number: None,
                image: record.image.clone(),
                source: SOURCE_TAG.to_string(),
                search_info: performers,
                only_link_matching: true,
                cant_retrieve_occurrences: false,
            },
            address: AddressIntegration {
                coordinates: [
                    parse_coordinate(location.longitude.as_deref()),
                    parse_coordinate(location.latitude.as_deref()),
                ],
                street: street_or_place(postal.street_address, location.name.clone()),
                city: postal.address_locality,
                postal_code: postal.postal_code,
                country: postal.address_country,
            },
            place: PlaceIntegration {
                name: location.name,
                description: None,
            },
            place_link: None,
            categories: BTreeSet::from([Category::Festival]),
            occurrences,
            event_link: EventLinkIntegration {
                link: source_url.to_string(),
                bookable: false,
            },
        }
    }
}

/// One occurrence per sub-event, or a single one spanning the festival
/// dates when there are none. The list is never empty.
pub fn derive_occurrences(record: &FestivalRecord, now: DateTime<Utc>) -> Vec<OccurrenceIntegration> {
    if record.sub_events.is_empty() {
        return vec![OccurrenceIntegration {
            start_date: record.start_date.as_deref().and_then(parse_source_date),
            end_date: record.end_date.as_deref().and_then(parse_source_date),
            end_date_is_not_reliable: true,
            not_available: None,
        }];
    }

    record
        .sub_events
        .iter()
        .map(|sub_event| sub_event_occurrence(sub_event, now))
        .collect()
}

fn sub_event_occurrence(sub_event: &SubEvent, now: DateTime<Utc>) -> OccurrenceIntegration {
    let start_date = sub_event.start_date.as_deref().and_then(parse_source_date);
    let scheduled = sub_event
        .event_status
        .as_deref()
        .map_or(false, |status| status.contains(SCHEDULED_STATUS_TOKEN));

    OccurrenceIntegration {
        start_date,
        end_date: start_date.map(|start| start + Duration::hours(SUB_EVENT_DURATION_HOURS)),
        end_date_is_not_reliable: true,
        not_available: (!scheduled).then_some(now),
    }
}

/// Every named performer across all sub-events, in order
pub fn collect_performers(record: &FestivalRecord) -> Vec<String> {
    record
        .sub_events
        .iter()
        .flat_map(|sub_event| sub_event.performers.iter())
        .filter_map(|performer| performer.name.clone())
        .collect()
}

/// `<p>{lead_in} A, B.</p>`; with no performers, `<p>{lead_in}.</p>`
pub fn build_description(lead_in: &str, performers: &[String]) -> String {
    let names = performers
        .iter()
        .map(|name| format!(" {}", name))
        .collect::<Vec<_>>()
        .join(",");
    format!("<p>{}{}.</p>", lead_in, names)
}

/// Reads a longitude or latitude. Non-numeric or missing text gives NaN,
/// blank text gives 0.
pub fn parse_coordinate(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        Some("") => 0.0,
        Some(text) => text.parse().unwrap_or(f64::NAN),
        None => f64::NAN,
    }
}

fn street_or_place(street: Option<String>, place_name: Option<String>) -> Option<String> {
    match street {
        Some(street) if !street.trim().is_empty() => Some(street),
        _ => place_name,
    }
}

/// Accepts RFC 3339 timestamps, offset-less local date-times and bare dates.
/// Local values are read as Paris time, bare dates as local midnight.
pub fn parse_source_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return paris_to_utc(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(paris_to_utc)
}

fn paris_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Paris
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
