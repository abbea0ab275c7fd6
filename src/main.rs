//! Outage Map server.
//!
//! # API Endpoints
//!
//! - `GET /outages/current` - Live map of the newest snapshot
//! - `GET /outages/day/:date` - Map of an archived day
//! - `GET /days` - Archived days, newest first
//! - `POST /feed` - Archive a feed document
//! - `GET /health` - Health check
//!
//! When `OUTAGEMAP_FEED_URL` is set, the published feed is polled and archived
//! under the current day.

use std::net::SocketAddr;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use outage_map::api::{AppState, router};
use outage_map::config::Config;
use outage_map::source::FeedClient;
use outage_map::storage::Storage;
use outage_map::view::local_day;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("outage_map=info".parse()?))
        .init();

    let config = Config::from_env()?;
    let tz = config.timezone;

    info!(
        port = config.port,
        db_url = %config.database_url,
        timezone = %tz,
        "Starting Outage Map server"
    );

    let storage = Storage::new(&config.database_url).await?;
    info!("Database initialized");

    if let Some(url) = &config.feed_url {
        let client = FeedClient::new(url, tz);
        tokio::spawn(poll_feed(client, storage.clone(), config.poll_interval, tz));
        info!(url = %url, interval_secs = config.poll_interval.as_secs(), "Feed polling enabled");
    }

    let app = router(AppState { storage, tz });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Outage Map is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fetch the feed on every tick and archive it under the current local day.
async fn poll_feed(client: FeedClient, storage: Storage, every: std::time::Duration, tz: Tz) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let feed = match client.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(url = %client.url(), error = %e, "Feed fetch failed");
                continue;
            }
        };

        let day = local_day(Utc::now(), tz);
        match storage.store_feed(day, &feed).await {
            Ok(()) => info!(%day, records = feed.records.len(), "Feed archived"),
            Err(e) => warn!(%day, error = %e, "Failed to archive feed"),
        }
    }
}
