//! HTTP API handlers for Outage Map.
//!
//! - **GET /outages/current**: live map of the newest archived snapshot.
//! - **GET /outages/day/:date**: historical map of one archived day.
//! - **GET /days**: archived days for the date selector.
//! - **POST /feed**: archive a feed document.
//!
//! Every map response is a single render pass: the reference instant is
//! resolved once per request, before any record is classified.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::feed::OutageFeed;
use crate::layers::{LayerMeta, LayerSummary, MapLayers};
use crate::storage::Storage;
use crate::view::{ViewMode, local_day, parse_day, parse_reference};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    /// Zone for naive feed timestamps and calendar days.
    pub tz: Tz,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/outages/current", get(get_current))
        .route("/outages/day/:date", get(get_day))
        .route("/days", get(get_days))
        .route("/feed", post(post_feed))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A rendered map.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    /// "live" or "historical".
    pub mode: ViewMode,
    /// Archived day the records come from, if any.
    pub day: Option<NaiveDate>,
    /// Instant every record was judged against.
    pub reference: DateTime<Utc>,
    /// When the publisher last refreshed the snapshot.
    pub last_update: Option<DateTime<Utc>>,
    pub layers: MapLayers,
    pub summary: LayerSummary,
    /// Title and default visibility of each layer, in display order.
    pub layers_meta: Vec<LayerMeta>,
}

impl MapResponse {
    fn render(
        feed: Option<&OutageFeed>,
        day: Option<NaiveDate>,
        reference: DateTime<Utc>,
        mode: ViewMode,
    ) -> Self {
        let layers = match feed {
            Some(feed) => MapLayers::build(&feed.records, reference, mode),
            None => MapLayers::default(),
        };

        Self {
            mode,
            day,
            reference,
            last_update: feed.and_then(|f| f.last_update),
            summary: layers.summary.clone(),
            layers,
            layers_meta: LayerMeta::all(),
        }
    }
}

/// Query parameters for GET /outages/current.
#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    /// Pin the reference instant instead of using the server clock.
    pub at: Option<String>,
}

/// GET /outages/current - Live map.
///
/// Uses the newest archived snapshot. With no snapshot yet, all layers are
/// empty.
///
/// # Query Parameters
///
/// - `at` (optional): reference instant (RFC 3339 or naive ISO-8601)
#[instrument(skip(state))]
pub async fn get_current(
    State(state): State<AppState>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<MapResponse>, StatusCode> {
    let now = match query.at.as_deref() {
        Some(raw) => parse_reference(raw, state.tz).map_err(|e| {
            warn!(error = %e, "Rejected reference instant");
            StatusCode::BAD_REQUEST
        })?,
        None => Utc::now(),
    };
    let reference = ViewMode::Live
        .reference_instant(now, state.tz)
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let day = state.storage.latest_day().await.map_err(internal_error)?;
    let feed = match day {
        Some(day) => state.storage.load_feed(day).await.map_err(internal_error)?,
        None => None,
    };

    let response = MapResponse::render(feed.as_ref(), day, reference, ViewMode::Live);
    info!(
        day = ?response.day,
        visible = response.summary.visible,
        hidden = response.summary.hidden,
        "Live map rendered"
    );
    Ok(Json(response))
}

/// GET /outages/day/:date - Historical map of one archived day.
///
/// Records are judged at the end of the selected day. Returns `400` for a
/// malformed date and `404` when nothing was archived for it.
#[instrument(skip(state))]
pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<MapResponse>, StatusCode> {
    let day = parse_day(&date).map_err(|e| {
        warn!(error = %e, "Rejected day");
        StatusCode::BAD_REQUEST
    })?;
    let mode = ViewMode::Historical(day);
    let reference = mode
        .reference_instant(Utc::now(), state.tz)
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let feed = state
        .storage
        .load_feed(day)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let response = MapResponse::render(Some(&feed), Some(day), reference, mode);
    info!(
        %day,
        visible = response.summary.visible,
        hidden = response.summary.hidden,
        "Historical map rendered"
    );
    Ok(Json(response))
}

/// Response for GET /days.
#[derive(Debug, Serialize)]
pub struct DaysResponse {
    /// Newest first.
    pub days: Vec<NaiveDate>,
}

/// GET /days - Days available for the historical view.
#[instrument(skip(state))]
pub async fn get_days(State(state): State<AppState>) -> Result<Json<DaysResponse>, StatusCode> {
    let days = state.storage.available_days().await.map_err(internal_error)?;
    Ok(Json(DaysResponse { days }))
}

/// Query parameters for POST /feed.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Day to archive under (default: today).
    pub date: Option<String>,
}

/// Response for POST /feed.
#[derive(Debug, Serialize)]
pub struct FeedStored {
    pub day: NaiveDate,
    pub records: usize,
}

/// POST /feed - Archive a feed document.
///
/// The body is the published `outages.json`. Invalid items are dropped;
/// a body that is not JSON is rejected with `400`.
#[instrument(skip(state, body))]
pub async fn post_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    body: String,
) -> Result<(StatusCode, Json<FeedStored>), StatusCode> {
    let day = match query.date.as_deref() {
        Some(raw) => parse_day(raw).map_err(|e| {
            warn!(error = %e, "Rejected day");
            StatusCode::BAD_REQUEST
        })?,
        None => local_day(Utc::now(), state.tz),
    };

    let feed = OutageFeed::from_json(&body, state.tz).map_err(|e| {
        warn!(error = %e, "Rejected feed document");
        StatusCode::BAD_REQUEST
    })?;

    state.storage.store_feed(day, &feed).await.map_err(internal_error)?;
    info!(%day, records = feed.records.len(), "Feed archived");

    Ok((
        StatusCode::CREATED,
        Json(FeedStored {
            day,
            records: feed.records.len(),
        }),
    ))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    warn!(error = %e, "Storage failure");
    StatusCode::INTERNAL_SERVER_ERROR
}
