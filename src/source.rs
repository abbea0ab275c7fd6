//! Client for the published outage feed.
//!
//! The scraper publishes `outages.json` as a static file; this client fetches
//! and validates it so the poller can archive it.

use chrono_tz::Tz;
use tracing::debug;

use crate::feed::OutageFeed;

/// Client for downloading the feed document.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    tz: Tz,
}

impl FeedClient {
    /// Create a client for the feed at `url`; naive timestamps are read in `tz`.
    pub fn new(url: &str, tz: Tz) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            tz,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and parse the feed.
    ///
    /// An empty body (the publisher is mid-write or has nothing yet) yields an
    /// empty feed.
    pub async fn fetch(&self) -> anyhow::Result<OutageFeed> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let feed = OutageFeed::from_json(&body, self.tz)?;
        debug!(url = %self.url, records = feed.records.len(), "Feed fetched");
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use tokio::net::TcpListener;

    async fn serve(body: &'static str) -> String {
        let app = Router::new().route("/outages.json", get(move || async move { body }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/outages.json")
    }

    fn utc() -> Tz {
        Tz::UTC
    }

    #[tokio::test]
    async fn test_fetch_feed() {
        let url = serve(
            r#"{"planned": [], "unplanned": [
                {"type": "unplanned", "geocoded_address": "Włościańska, Poznań", "lat": 52.44, "lon": 16.91,
                 "start_time": "Brak danych", "end_time": "2025-12-04T11:00:00",
                 "original_description": "ul. Włościańska", "id": "x1"}
            ], "last_update": "2025-12-04T09:00:00+00:00"}"#,
        )
        .await;

        let feed = FeedClient::new(&url, utc()).fetch().await.unwrap();

        assert_eq!(feed.records.len(), 1);
        assert_eq!(feed.records[0].id, "x1");
        assert!(feed.last_update.is_some());
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let url = serve("").await;
        let feed = FeedClient::new(&url, utc()).fetch().await.unwrap();
        assert!(feed.records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_document() {
        let url = serve("{}").await.replace("outages.json", "missing.json");
        assert!(FeedClient::new(&url, utc()).fetch().await.is_err());
    }
}
