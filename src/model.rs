//! Data models for Outage Map.
//!
//! Outage records arrive from a scraped feed where a timestamp may be missing
//! or replaced by a literal unknown-marker. Everything in this module turns
//! that loose wire shape into closed Rust types once, at the boundary, so the
//! classifier only ever sees `Option<DateTime<Utc>>` and a tagged kind.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Literal the scraper writes in place of a timestamp it could not read.
pub const UNKNOWN_TIME_MARKER: &str = "Brak danych";

/// Naive timestamp layouts accepted from the feed.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Kind of power interruption.
///
/// Unknown wire values are preserved as `Unrecognized` instead of rejecting the
/// whole feed; the classifier hides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutageKind {
    /// Announced maintenance with a scheduled window.
    Planned,
    /// Failure reported after the fact, usually with an estimated end.
    Unplanned,
    /// Any other value the upstream source may start emitting.
    Unrecognized(String),
}

impl OutageKind {
    /// Wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            OutageKind::Planned => "planned",
            OutageKind::Unplanned => "unplanned",
            OutageKind::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for OutageKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "planned" => OutageKind::Planned,
            "unplanned" => OutageKind::Unplanned,
            _ => OutageKind::Unrecognized(raw),
        }
    }
}

impl From<OutageKind> for String {
    fn from(kind: OutageKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Where an outage is drawn. Opaque to classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Geocoded address text.
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

/// A single outage, validated and ready for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageRecord {
    /// Stable identifier, used to deduplicate markers.
    pub id: String,

    pub kind: OutageKind,

    /// Scheduled start. Only meaningful for planned outages.
    pub start: Option<DateTime<Utc>>,

    /// Scheduled or estimated end. `None` when the source did not know it.
    pub end: Option<DateTime<Utc>>,

    pub location: Location,

    /// Free text copied from the operator's announcement.
    pub description: String,
}

/// An outage item exactly as it appears in the feed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOutage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub geocoded_address: String,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lon: Option<f64>,

    /// ISO-8601 timestamp or [`UNKNOWN_TIME_MARKER`].
    #[serde(default)]
    pub start_time: Option<String>,

    /// ISO-8601 timestamp or [`UNKNOWN_TIME_MARKER`].
    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default)]
    pub original_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RawOutage {
    /// Validate this item into an [`OutageRecord`].
    ///
    /// `fallback_kind` applies when the item carries no `type` of its own
    /// (the list it was found in decides). Naive timestamps are local times
    /// in `tz`.
    pub fn into_record(self, fallback_kind: OutageKind, tz: Tz) -> Result<OutageRecord> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_id(&format!(
                "{}|{}|{}|{}",
                self.geocoded_address,
                self.original_description,
                self.start_time.as_deref().unwrap_or_default(),
                self.end_time.as_deref().unwrap_or_default(),
            )),
        };

        let (lat, lon) = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
            _ => return Err(Error::MissingCoordinates { id }),
        };

        let kind = self.kind.map(OutageKind::from).unwrap_or(fallback_kind);
        let start = parse_timestamp("start_time", self.start_time.as_deref(), tz)?;
        let end = parse_timestamp("end_time", self.end_time.as_deref(), tz)?;

        Ok(OutageRecord {
            id,
            kind,
            start,
            end,
            location: Location {
                address: self.geocoded_address,
                lat,
                lon,
            },
            description: self.original_description,
        })
    }
}

/// Parse a feed timestamp.
///
/// Returns `Ok(None)` for an absent field, an empty string, or the unknown
/// marker. RFC 3339 values keep their own offset; naive values are local
/// times in `tz`. Anything else is an error.
pub fn parse_timestamp(
    field: &'static str,
    raw: Option<&str>,
    tz: Tz,
) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case(UNKNOWN_TIME_MARKER) {
        return Ok(None);
    }

    parse_instant(raw, tz)
        .map(Some)
        .ok_or_else(|| Error::invalid_timestamp(field, raw))
}

/// Parse an ISO-8601 instant, with or without an explicit offset.
pub(crate) fn parse_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| resolve_local(naive, tz))
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// A time repeated when clocks go back resolves to its first occurrence. A
/// time skipped when clocks go forward is moved forward by the size of the
/// gap (one hour), the way browsers read such times.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => tz
            .from_local_datetime(&naive.checked_add_signed(TimeDelta::hours(1))?)
            .earliest()?,
    };
    Some(local.with_timezone(&Utc))
}

/// Derive a stable `outage-<n>` identifier from arbitrary text.
///
/// Rolling 31-multiplier hash over UTF-16 code units with 32-bit wrap-around,
/// so identifiers match the ones the map front-end already generated.
pub fn generate_id(input: &str) -> String {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    format!("outage-{}", hash.unsigned_abs())
}
