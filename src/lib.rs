//! Outage Map - classifies power outages into map layers.
//!
//! # Overview
//!
//! The scraper publishes planned and unplanned power interruptions as a JSON
//! feed. Outage Map archives that feed per day and renders it as four marker
//! layers (unplanned, ongoing, starting within 24h, other) for either the
//! live view or a selected past day.
//!
//! The decision logic lives in [`classifier::classify`], a pure function of
//! one record, a reference instant, and a [`view::ViewMode`]. Everything else
//! feeds it or consumes its output.
//!
//! # Modules
//!
//! - [`model`]: Outage records and feed-item validation
//! - [`view`]: View modes and reference instants
//! - [`classifier`]: Temporal classification of a single outage
//! - [`layers`]: One render pass bucketing outages into layers
//! - [`feed`]: The published feed document
//! - [`storage`]: SQLite archive of daily snapshots
//! - [`source`]: HTTP client for the published feed
//! - [`config`]: Environment configuration
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod feed;
pub mod layers;
pub mod model;
pub mod source;
pub mod storage;
pub mod view;

pub use classifier::{Category, Classification, StatusLabel, classify};
pub use error::{Error, Result};
pub use model::{OutageKind, OutageRecord};
pub use view::ViewMode;
