//! Boundary errors for Outage Map.
//!
//! Classification itself never fails. These errors only appear where raw
//! input (feed documents, query parameters, configuration) is turned into
//! domain types.

use thiserror::Error;

/// Result alias for boundary validation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating external input.
#[derive(Error, Debug)]
pub enum Error {
    /// A timestamp field held something that is neither a timestamp nor the
    /// unknown-marker.
    #[error("invalid timestamp in '{field}': {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// A record cannot be placed on the map without coordinates.
    #[error("record {id:?} has no coordinates")]
    MissingCoordinates { id: String },

    /// The caller supplied a reference instant that could not be parsed or
    /// represented.
    #[error("invalid reference instant: {0}")]
    InvalidReference(String),

    /// A calendar day could not be parsed.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Configuration value out of range or unparsable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Feed document was not valid JSON.
    #[error("feed JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_timestamp(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            field,
            value: value.into(),
        }
    }
}
