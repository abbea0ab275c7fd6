//! The published outage feed document.
//!
//! ```json
//! {
//!     "planned": [ { "type": "planned", "geocoded_address": "...", "lat": 52.4, "lon": 16.9,
//!                    "start_time": "2025-12-05T10:00:00", "end_time": "2025-12-05T14:00:00",
//!                    "original_description": "...", "id": "..." } ],
//!     "unplanned": [ ... ],
//!     "last_update": "2025-12-05T06:00:00+00:00"
//! }
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{OutageKind, OutageRecord, RawOutage, parse_timestamp};

/// Value the publisher writes when it has never completed an update.
const NO_UPDATE_MARKER: &str = "N/A";

/// Feed document as published.
///
/// Items stay untyped here so one malformed item is dropped on its own
/// instead of failing the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFeed {
    #[serde(default)]
    pub planned: Vec<Value>,

    #[serde(default)]
    pub unplanned: Vec<Value>,

    #[serde(default)]
    pub last_update: Option<Value>,
}

/// A validated snapshot of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutageFeed {
    /// When the publisher last refreshed the data.
    pub last_update: Option<DateTime<Utc>>,

    /// Records in document order: planned list first, then unplanned.
    pub records: Vec<OutageRecord>,
}

impl OutageFeed {
    /// Parse a feed body. An empty body is an empty feed.
    pub fn from_json(body: &str, tz: Tz) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: RawFeed = serde_json::from_str(body)?;
        Ok(Self::from_raw(raw, tz))
    }

    /// Validate every item of a raw document.
    ///
    /// Items that fail validation are logged and left out; the rest of the
    /// batch is kept.
    pub fn from_raw(raw: RawFeed, tz: Tz) -> Self {
        let last_update = raw
            .last_update
            .as_ref()
            .and_then(Value::as_str)
            .filter(|value| value.trim() != NO_UPDATE_MARKER)
            .and_then(|value| match parse_timestamp("last_update", Some(value), tz) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable last_update");
                    None
                }
            });

        let items = raw
            .planned
            .into_iter()
            .map(|item| (OutageKind::Planned, item))
            .chain(raw.unplanned.into_iter().map(|item| (OutageKind::Unplanned, item)));

        let mut records = Vec::new();
        let mut rejected = 0usize;

        for (list_kind, item) in items {
            let parsed = serde_json::from_value::<RawOutage>(item)
                .map_err(Error::from)
                .and_then(|raw| raw.into_record(list_kind, tz));

            match parsed {
                Ok(record) => records.push(record),
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "Dropping invalid outage record");
                }
            }
        }

        debug!(accepted = records.len(), rejected, "Feed parsed");

        Self {
            last_update,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> Tz {
        Tz::UTC
    }

    const SAMPLE: &str = r#"{
        "planned": [
            {
                "type": "planned",
                "geocoded_address": "Testowa, Poznań, Polska",
                "lat": 52.4, "lon": 16.9,
                "start_time": "2025-12-05T10:00:00",
                "end_time": "2025-12-05T14:00:00",
                "original_description": "Test planned outage",
                "id": "test-planned-1"
            }
        ],
        "unplanned": [
            {
                "type": "unplanned",
                "geocoded_address": "Włościańska, Piątkowo, Poznań, województwo wielkopolskie, 61-691, Polska",
                "lat": 52.4439011,
                "lon": 16.91018,
                "start_time": "Brak danych",
                "end_time": "2025-12-04T11:00:00",
                "original_description": "Poznań os. Bolesława Śmiałego, ul. Włościańska.",
                "id": "4c8a80c90bdf604d473b88245518562f"
            }
        ],
        "last_update": "2025-12-04T09:15:00+00:00"
    }"#;

    #[test]
    fn test_parse_sample() {
        let feed = OutageFeed::from_json(SAMPLE, utc()).unwrap();

        assert_eq!(feed.records.len(), 2);
        assert_eq!(feed.records[0].kind, OutageKind::Planned);
        assert_eq!(feed.records[1].kind, OutageKind::Unplanned);
        assert_eq!(feed.records[1].start, None);
        assert_eq!(
            feed.last_update,
            Some(Utc.with_ymd_and_hms(2025, 12, 4, 9, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_empty_body() {
        let feed = OutageFeed::from_json("  ", utc()).unwrap();
        assert!(feed.records.is_empty());
        assert!(feed.last_update.is_none());
    }

    #[test]
    fn test_missing_lists_and_no_update_marker() {
        let feed = OutageFeed::from_json(r#"{"last_update": "N/A"}"#, utc()).unwrap();
        assert!(feed.records.is_empty());
        assert!(feed.last_update.is_none());
    }

    #[test]
    fn test_invalid_item_is_dropped() {
        let body = r#"{
            "unplanned": [
                { "geocoded_address": "A", "lat": 52.0, "lon": 16.0, "end_time": "not a date" },
                { "geocoded_address": "B", "lat": 52.0, "lon": 16.0, "end_time": "2025-12-04T11:00:00" }
            ]
        }"#;
        let feed = OutageFeed::from_json(body, utc()).unwrap();

        assert_eq!(feed.records.len(), 1);
        assert_eq!(feed.records[0].location.address, "B");
        assert_eq!(feed.records[0].kind, OutageKind::Unplanned);
    }

    #[test]
    fn test_item_with_wrong_field_types_is_dropped() {
        let body = r#"{
            "planned": [
                { "geocoded_address": "A", "lat": 52.0, "lon": 16.0, "start_time": 1733392800, "end_time": "2025-12-05T14:00:00" },
                { "geocoded_address": "B", "lat": "north", "lon": 16.0, "start_time": "2025-12-05T10:00:00", "end_time": "2025-12-05T14:00:00" },
                { "geocoded_address": "C", "lat": 52.0, "lon": 16.0, "start_time": "2025-12-05T10:00:00", "end_time": "2025-12-05T14:00:00" }
            ],
            "last_update": 42
        }"#;
        let feed = OutageFeed::from_json(body, utc()).unwrap();

        assert_eq!(feed.records.len(), 1);
        assert_eq!(feed.records[0].location.address, "C");
        assert!(feed.last_update.is_none());
    }

    #[test]
    fn test_summer_feed_uses_local_daylight_time() {
        let body = r#"{
            "planned": [
                { "geocoded_address": "A", "lat": 52.0, "lon": 16.0,
                  "start_time": "2025-07-05T10:00:00", "end_time": "2025-07-05T14:00:00" }
            ]
        }"#;
        let feed = OutageFeed::from_json(body, Tz::Europe__Warsaw).unwrap();

        assert_eq!(feed.records[0].start, Some(Utc.with_ymd_and_hms(2025, 7, 5, 8, 0, 0).unwrap()));
        assert_eq!(feed.records[0].end, Some(Utc.with_ymd_and_hms(2025, 7, 5, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_malformed_json() {
        assert!(OutageFeed::from_json("{ planned: ", utc()).is_err());
    }
}
