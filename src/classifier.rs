//! Temporal classification of outages.
//!
//! [`classify`] decides, for one record, whether it is shown and in which map
//! layer. It is pure: the same record, reference instant and mode always give
//! the same answer, and nothing outside the arguments is read.
//!
//! # Rules
//!
//! Unplanned outages:
//! - unknown end: hidden
//! - live view and `end < reference`: hidden
//! - otherwise: [`Category::Unplanned`]
//!
//! Planned outages (first match wins):
//! - unknown start or end: hidden
//! - `start <= reference <= end`: [`Category::Ongoing`] (any mode)
//! - live view and `reference < start <= reference + 24h`: [`Category::Next24h`]
//! - otherwise: [`Category::Other`], concluded if `reference > end`, else upcoming

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::model::{OutageKind, OutageRecord};
use crate::view::ViewMode;

/// How far ahead the live view flags imminent planned outages.
pub const HORIZON_HOURS: i64 = 24;

/// Map layer an outage is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Unplanned,
    Ongoing,
    Next24h,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Unplanned,
        Category::Ongoing,
        Category::Next24h,
        Category::Other,
    ];

    /// Layer title shown in the layer switcher.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Unplanned => "Unplanned outages",
            Category::Ongoing => "Planned (ongoing)",
            Category::Next24h => "Planned (within 24h)",
            Category::Other => "Planned (other)",
        }
    }

    /// Whether the layer starts switched on.
    pub fn shown_by_default(&self) -> bool {
        matches!(self, Category::Unplanned | Category::Ongoing)
    }
}

/// Human-readable status attached to a visible outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Unplanned,
    PlannedOngoing,
    PlannedWithin24h,
    PlannedConcluded,
    PlannedUpcoming,
}

impl StatusLabel {
    pub fn label(&self) -> &'static str {
        match self {
            StatusLabel::Unplanned => "Unplanned outage",
            StatusLabel::PlannedOngoing => "Planned (ongoing)",
            StatusLabel::PlannedWithin24h => "Planned (starting within 24h)",
            StatusLabel::PlannedConcluded => "Planned (concluded)",
            StatusLabel::PlannedUpcoming => "Planned (upcoming)",
        }
    }
}

/// Why a record is left off the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    /// Unplanned outage without an end time.
    UnknownEnd,
    /// Planned outage missing its start or end.
    UnknownWindow,
    /// Unplanned outage that ended before "now" in the live view.
    Concluded,
    /// Kind the classifier does not know.
    UnrecognizedKind,
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Hidden(HiddenReason),
    Visible { category: Category, status: StatusLabel },
}

impl Classification {
    pub fn is_visible(&self) -> bool {
        matches!(self, Classification::Visible { .. })
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Classification::Visible { category, .. } => Some(*category),
            Classification::Hidden(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusLabel> {
        match self {
            Classification::Visible { status, .. } => Some(*status),
            Classification::Hidden(_) => None,
        }
    }

    fn visible(category: Category, status: StatusLabel) -> Self {
        Classification::Visible { category, status }
    }
}

/// Classify `outage` against `reference` for the given view mode.
pub fn classify(outage: &OutageRecord, reference: DateTime<Utc>, mode: ViewMode) -> Classification {
    match &outage.kind {
        OutageKind::Unplanned => classify_unplanned(outage.end, reference, mode),
        OutageKind::Planned => classify_planned(outage.start, outage.end, reference, mode),
        OutageKind::Unrecognized(_) => Classification::Hidden(HiddenReason::UnrecognizedKind),
    }
}

fn classify_unplanned(
    end: Option<DateTime<Utc>>,
    reference: DateTime<Utc>,
    mode: ViewMode,
) -> Classification {
    let Some(end) = end else {
        return Classification::Hidden(HiddenReason::UnknownEnd);
    };

    if mode.is_live() && end < reference {
        return Classification::Hidden(HiddenReason::Concluded);
    }

    Classification::visible(Category::Unplanned, StatusLabel::Unplanned)
}

fn classify_planned(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    reference: DateTime<Utc>,
    mode: ViewMode,
) -> Classification {
    let (Some(start), Some(end)) = (start, end) else {
        return Classification::Hidden(HiddenReason::UnknownWindow);
    };

    if start <= reference && reference <= end {
        return Classification::visible(Category::Ongoing, StatusLabel::PlannedOngoing);
    }

    if mode.is_live() && start > reference && start <= horizon(reference) {
        return Classification::visible(Category::Next24h, StatusLabel::PlannedWithin24h);
    }

    let status = if reference > end {
        StatusLabel::PlannedConcluded
    } else {
        StatusLabel::PlannedUpcoming
    };
    Classification::visible(Category::Other, status)
}

/// `reference + 24h`, saturating at the largest representable instant.
fn horizon(reference: DateTime<Utc>) -> DateTime<Utc> {
    reference
        .checked_add_signed(TimeDelta::hours(HORIZON_HOURS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
