//! View modes and the reference instant they are judged against.
//!
//! A render pass resolves its reference instant once and passes it, together
//! with the [`ViewMode`], to every classification in that pass.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::model::{parse_instant, resolve_local};

/// Which map the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Real-time view; the reference instant is "now".
    Live,
    /// Review of a selected calendar day.
    Historical(NaiveDate),
}

impl ViewMode {
    pub fn is_live(&self) -> bool {
        matches!(self, ViewMode::Live)
    }

    /// Resolve the reference instant for this mode.
    ///
    /// `now` is used for [`ViewMode::Live`]. A historical day is judged at its
    /// last second (23:59:59 local time in `tz`), once the whole day has elapsed.
    pub fn reference_instant(&self, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>> {
        match self {
            ViewMode::Live => Ok(now),
            ViewMode::Historical(day) => end_of_day(*day, tz),
        }
    }
}

impl Serialize for ViewMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ViewMode::Live => serializer.serialize_str("live"),
            ViewMode::Historical(_) => serializer.serialize_str("historical"),
        }
    }
}

fn end_of_day(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)
        .ok_or_else(|| Error::InvalidReference("23:59:59".to_string()))?;

    resolve_local(day.and_time(last_second), tz)
        .ok_or_else(|| Error::InvalidReference(format!("end of {day}")))
}

/// Validate a caller-supplied reference instant.
///
/// Accepts RFC 3339 or a naive ISO-8601 timestamp read in `tz`.
pub fn parse_reference(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    parse_instant(raw, tz).ok_or_else(|| Error::InvalidReference(raw.to_string()))
}

/// Parse a `YYYY-MM-DD` calendar day.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(raw.to_string()))
}

/// The calendar day `instant` falls on in `tz`.
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
