use super::SnapshotStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

/// SQLite-backed session store.
///
/// WAL mode plus synchronous NORMAL keep write amplification low on
/// flash storage. Snapshots are small JSON strings keyed by session.
#[derive(Clone, Debug)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn new(db_url: &str) -> Result<Self> {
        let connection_options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_sessions (
                key TEXT PRIMARY KEY,
                snapshot TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Deletes sessions that have not been written for `max_age`.
    /// Abandoned wizards would otherwise accumulate forever.
    pub async fn purge_older_than(&self, max_age: Duration) -> Result<u64> {
        // CURRENT_TIMESTAMP writes "YYYY-MM-DD HH:MM:SS"; comparing
        // against the same text format keeps the ordering correct.
        let cutoff = (Utc::now() - max_age)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let result = sqlx::query("DELETE FROM form_sessions WHERE updated_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SnapshotStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT snapshot FROM form_sessions WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("snapshot")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO form_sessions (key, snapshot, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE
            SET snapshot = excluded.snapshot, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM form_sessions WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
