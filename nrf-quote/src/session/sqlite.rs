//! SQLite-backed session store
//!
//! One row per session holding the JSON-encoded record. Rows not written
//! for longer than the configured TTL read as empty and are deleted by
//! [`SessionStore::purge_expired`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use tracing::{debug, info};

use super::{ttl_from_hours, SessionId, SessionRecord, SessionStore};
use crate::error::{ApiError, ApiResult};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

fn timestamp(ts: DateTime<Utc>) -> String {
    // Fixed-width UTC format so TEXT comparison orders correctly
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct SqliteSessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteSessionStore {
    /// Open (creating if needed) the session database at `path`
    pub async fn open(path: &Path, ttl_hours: u64) -> ApiResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        info!("Session database: {}", path.display());
        Self::with_pool(pool, ttl_hours).await
    }

    /// In-memory database, for tests
    pub async fn in_memory(ttl_hours: u64) -> ApiResult<Self> {
        // A single connection: each new in-memory connection is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool, ttl_hours).await
    }

    async fn with_pool(pool: SqlitePool, ttl_hours: u64) -> ApiResult<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;

        let ttl = ttl_from_hours(ttl_hours)?;
        Ok(Self { pool, ttl })
    }

    fn is_expired(&self, updated_at: &str) -> bool {
        match DateTime::parse_from_rfc3339(updated_at) {
            Ok(ts) => ts.with_timezone(&Utc) + self.ttl < Utc::now(),
            Err(_) => true,
        }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: SessionId) -> ApiResult<SessionRecord> {
        let row = sqlx::query("SELECT data, updated_at FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(SessionRecord::default());
        };

        let updated_at: String = row.try_get("updated_at")?;
        if self.is_expired(&updated_at) {
            debug!(session = %id, "Session expired, starting fresh");
            return Ok(SessionRecord::default());
        }

        let data: String = row.try_get("data")?;
        serde_json::from_str(&data)
            .map_err(|e| ApiError::Session(format!("corrupt session record {}: {}", id, e)))
    }

    async fn save(&self, id: SessionId, record: &SessionRecord) -> ApiResult<()> {
        let data = serde_json::to_string(record)
            .map_err(|e| ApiError::Session(format!("failed to encode session {}: {}", id, e)))?;

        sqlx::query(
            "INSERT INTO sessions (id, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(id.to_string())
        .bind(data)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_expired(&self) -> ApiResult<u64> {
        let cutoff = timestamp(Utc::now() - self.ttl);
        let result = sqlx::query("DELETE FROM sessions WHERE updated_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrf_common::state::StateMap;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let store = SqliteSessionStore::in_memory(24).await.unwrap();
        let record = store.load(SessionId::new()).await.unwrap();
        assert_eq!(record, SessionRecord::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = SqliteSessionStore::in_memory(24).await.unwrap();
        let id = SessionId::new();

        let bucket: StateMap = serde_json::from_value(json!({ "buildingType-1": 3 })).unwrap();
        let record = SessionRecord {
            form: nrf_common::FormState::new().merge_bucket(&bucket),
            ..Default::default()
        };
        store.save(id, &record).await.unwrap();
        store.save(id, &record).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_expired_sessions_read_empty_and_purge() {
        let store = SqliteSessionStore::in_memory(1).await.unwrap();
        let id = SessionId::new();

        let stale = timestamp(Utc::now() - Duration::hours(2));
        sqlx::query("INSERT INTO sessions (id, data, updated_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(r#"{"form":{"email":"old@example.com"}}"#)
            .bind(stale)
            .execute(&store.pool)
            .await
            .unwrap();

        assert_eq!(store.load(id).await.unwrap(), SessionRecord::default());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.db");

        let store = SqliteSessionStore::open(&path, 24).await.unwrap();
        store.save(SessionId::new(), &SessionRecord::default()).await.unwrap();

        assert!(path.exists());
    }
}
