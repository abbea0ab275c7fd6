//! SQLite archive of feed snapshots, one per calendar day.
//!
//! The live view reads the newest day; the historical view reads the day the
//! user picked from [`Storage::available_days`]. Timestamps are stored as Unix
//! milliseconds, `NULL` when unknown.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::feed::OutageFeed;
use crate::model::{Location, OutageKind, OutageRecord};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:outages.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                day TEXT PRIMARY KEY,
                last_update_ms INTEGER,
                stored_at_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                day TEXT NOT NULL,
                position INTEGER NOT NULL,
                record_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                start_ms INTEGER,
                end_ms INTEGER,
                address TEXT NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Records are always read back per day, in document order
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_outages_day_position
            ON outages(day, position)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store `feed` as the snapshot for `day`, replacing any earlier one.
    pub async fn store_feed(&self, day: NaiveDate, feed: &OutageFeed) -> anyhow::Result<()> {
        let day = day.format(DAY_FORMAT).to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM outages WHERE day = ?")
            .bind(&day)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feeds (day, last_update_ms, stored_at_ms)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&day)
        .bind(feed.last_update.map(|ts| ts.timestamp_millis()))
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await?;

        for (position, record) in feed.records.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO outages
                    (day, position, record_id, kind, start_ms, end_ms, address, lat, lon, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&day)
            .bind(position as i64)
            .bind(&record.id)
            .bind(record.kind.as_str())
            .bind(record.start.map(|ts| ts.timestamp_millis()))
            .bind(record.end.map(|ts| ts.timestamp_millis()))
            .bind(&record.location.address)
            .bind(record.location.lat)
            .bind(record.location.lon)
            .bind(&record.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load the snapshot stored for `day`, if any.
    pub async fn load_feed(&self, day: NaiveDate) -> anyhow::Result<Option<OutageFeed>> {
        let day = day.format(DAY_FORMAT).to_string();

        let Some(feed_row) = sqlx::query("SELECT last_update_ms FROM feeds WHERE day = ?")
            .bind(&day)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT record_id, kind, start_ms, end_ms, address, lat, lon, description
            FROM outages
            WHERE day = ?
            ORDER BY position
            "#,
        )
        .bind(&day)
        .fetch_all(&self.pool)
        .await?;

        let last_update_ms: Option<i64> = feed_row.get("last_update_ms");

        Ok(Some(OutageFeed {
            last_update: last_update_ms.and_then(DateTime::from_timestamp_millis),
            records: rows.iter().map(record_from_row).collect(),
        }))
    }

    /// All days with a stored snapshot, newest first.
    pub async fn available_days(&self) -> anyhow::Result<Vec<NaiveDate>> {
        let rows = sqlx::query("SELECT day FROM feeds ORDER BY day DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|r| NaiveDate::parse_from_str(r.get::<&str, _>("day"), DAY_FORMAT).ok())
            .collect())
    }

    /// The newest day with a stored snapshot.
    pub async fn latest_day(&self) -> anyhow::Result<Option<NaiveDate>> {
        Ok(self.available_days().await?.into_iter().next())
    }
}

fn record_from_row(row: &SqliteRow) -> OutageRecord {
    let start_ms: Option<i64> = row.get("start_ms");
    let end_ms: Option<i64> = row.get("end_ms");

    OutageRecord {
        id: row.get("record_id"),
        kind: OutageKind::from(row.get::<String, _>("kind")),
        start: start_ms.and_then(DateTime::from_timestamp_millis),
        end: end_ms.and_then(DateTime::from_timestamp_millis),
        location: Location {
            address: row.get("address"),
            lat: row.get("lat"),
            lon: row.get("lon"),
        },
        description: row.get("description"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    fn record(id: &str, kind: OutageKind, end: Option<DateTime<Utc>>) -> OutageRecord {
        OutageRecord {
            id: id.to_string(),
            kind,
            start: Some(Utc.with_ymd_and_hms(2025, 12, 5, 10, 0, 0).unwrap()),
            end,
            location: Location {
                address: "Testowa, Poznań".to_string(),
                lat: 52.4,
                lon: 16.9,
            },
            description: "Test".to_string(),
        }
    }

    fn feed() -> OutageFeed {
        OutageFeed {
            last_update: Some(Utc.with_ymd_and_hms(2025, 12, 5, 6, 0, 0).unwrap()),
            records: vec![
                record("b", OutageKind::Planned, Some(Utc.with_ymd_and_hms(2025, 12, 5, 14, 0, 0).unwrap())),
                record("a", OutageKind::Unplanned, None),
                record("c", OutageKind::Unrecognized("emergency".to_string()), None),
            ],
        }
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        storage.store_feed(day(5), &feed()).await.unwrap();
        let loaded = storage.load_feed(day(5)).await.unwrap().unwrap();

        assert_eq!(loaded, feed());
    }

    #[tokio::test]
    async fn test_load_missing_day() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        assert!(storage.load_feed(day(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_replaces_snapshot() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        storage.store_feed(day(5), &feed()).await.unwrap();
        storage.store_feed(day(5), &OutageFeed::default()).await.unwrap();

        let loaded = storage.load_feed(day(5)).await.unwrap().unwrap();
        assert!(loaded.records.is_empty());
        assert!(loaded.last_update.is_none());
    }

    #[tokio::test]
    async fn test_available_days_newest_first() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        assert!(storage.latest_day().await.unwrap().is_none());

        for d in [4, 6, 5] {
            storage.store_feed(day(d), &OutageFeed::default()).await.unwrap();
        }

        assert_eq!(storage.available_days().await.unwrap(), vec![day(6), day(5), day(4)]);
        assert_eq!(storage.latest_day().await.unwrap(), Some(day(6)));
    }
}
