//! Bucketing classified outages into map layers.
//!
//! A [`MapLayers`] is one render pass: every record is judged against the same
//! reference instant, captured by the caller before the pass starts.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::classifier::{Category, Classification, StatusLabel, classify};
use crate::model::OutageRecord;
use crate::view::ViewMode;

/// A visible outage, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub category: Category,
    pub status: StatusLabel,
    /// Rendered form of `status`.
    pub status_label: &'static str,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Marker {
    fn new(record: &OutageRecord, category: Category, status: StatusLabel) -> Self {
        Self {
            id: record.id.clone(),
            category,
            status,
            status_label: status.label(),
            address: record.location.address.clone(),
            lat: record.location.lat,
            lon: record.location.lon,
            description: record.description.clone(),
            start_time: record.start,
            end_time: record.end,
        }
    }
}

/// Markers grouped by layer, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MapLayers {
    pub unplanned: Vec<Marker>,
    pub ongoing: Vec<Marker>,
    pub next24h: Vec<Marker>,
    pub other: Vec<Marker>,
    /// Serialized next to the layers by the response, not inside them.
    #[serde(skip)]
    pub summary: LayerSummary,
}

/// Layer-switcher entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerMeta {
    pub category: Category,
    pub title: &'static str,
    pub shown_by_default: bool,
}

impl LayerMeta {
    /// One entry per layer, in display order.
    pub fn all() -> Vec<LayerMeta> {
        Category::ALL
            .into_iter()
            .map(|category| LayerMeta {
                category,
                title: category.label(),
                shown_by_default: category.shown_by_default(),
            })
            .collect()
    }
}

/// Counts for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub total_records: usize,
    pub visible: usize,
    pub hidden: usize,
    /// Records skipped because their id was already placed.
    pub duplicates: usize,
    pub unplanned: usize,
    pub ongoing: usize,
    pub next24h: usize,
    pub other: usize,
}

impl MapLayers {
    /// Classify every record against `reference` and place the visible ones.
    ///
    /// The first record with a given id wins; later ones are counted as
    /// duplicates.
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a OutageRecord>,
        reference: DateTime<Utc>,
        mode: ViewMode,
    ) -> Self {
        let mut layers = MapLayers::default();
        let mut seen = HashSet::new();

        for record in records {
            layers.summary.total_records += 1;

            if !seen.insert(record.id.as_str()) {
                layers.summary.duplicates += 1;
                continue;
            }

            match classify(record, reference, mode) {
                Classification::Visible { category, status } => {
                    layers.push(Marker::new(record, category, status));
                }
                Classification::Hidden(reason) => {
                    trace!(id = %record.id, ?reason, "Outage hidden");
                    layers.summary.hidden += 1;
                }
            }
        }

        layers
    }

    fn push(&mut self, marker: Marker) {
        self.summary.visible += 1;
        match marker.category {
            Category::Unplanned => {
                self.summary.unplanned += 1;
                self.unplanned.push(marker);
            }
            Category::Ongoing => {
                self.summary.ongoing += 1;
                self.ongoing.push(marker);
            }
            Category::Next24h => {
                self.summary.next24h += 1;
                self.next24h.push(marker);
            }
            Category::Other => {
                self.summary.other += 1;
                self.other.push(marker);
            }
        }
    }

    /// Markers of a single layer.
    pub fn layer(&self, category: Category) -> &[Marker] {
        match category {
            Category::Unplanned => &self.unplanned,
            Category::Ongoing => &self.ongoing,
            Category::Next24h => &self.next24h,
            Category::Other => &self.other,
        }
    }
}
