//! Dedup ledger of tracks already uploaded to the channel.
//!
//! One row per song id, written once on successful upload and never updated
//! or deleted — a recorded track is permanently skipped on later runs.

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod ledger_tests;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// A track about to be recorded after its channel upload.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub channel_message_id: i64,
    pub duration_secs: u32,
    pub source_url: Option<String>,
    pub file_size_bytes: u64,
}

#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (creating if missing) the ledger database and ensure the schema.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // One connection: in-memory databases are per-connection, and the
        // pipeline issues its queries strictly sequentially anyway.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS uploaded_tracks (
                song_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                channel_message_id INTEGER NOT NULL,
                duration_secs INTEGER NOT NULL,
                source_url TEXT,
                file_size_bytes INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("Ledger ready at {}", database_url);
        Ok(Self { pool })
    }

    /// Has this song already been uploaded?
    pub async fn contains(&self, song_id: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM uploaded_tracks WHERE song_id = ?")
            .bind(song_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Record an upload. The primary key makes a second insert for the same
    /// song an error rather than a silent overwrite.
    pub async fn record(&self, entry: &NewEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO uploaded_tracks
                (song_id, title, artist, channel_message_id, duration_secs, source_url, file_size_bytes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.song_id)
        .bind(&entry.title)
        .bind(&entry.artist)
        .bind(entry.channel_message_id)
        .bind(entry.duration_secs)
        .bind(&entry.source_url)
        .bind(entry.file_size_bytes as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM uploaded_tracks")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("n")
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
