//! In-process session store
//!
//! Records live in a map keyed by session id, stamped with the time of
//! their last save. Entries idle past the TTL read as empty and are dropped
//! by [`SessionStore::purge_expired`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{ttl_from_hours, SessionId, SessionRecord, SessionStore};
use crate::error::ApiResult;

const DEFAULT_TTL_HOURS: i64 = 24;

struct Entry {
    record: SessionRecord,
    updated_at: DateTime<Utc>,
}

/// Session records held in memory; lost on restart
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionId, Entry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Store with a 24 hour TTL
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Store with the configured TTL in hours
    pub fn with_ttl_hours(ttl_hours: u64) -> ApiResult<Self> {
        Ok(Self::with_ttl(ttl_from_hours(ttl_hours)?))
    }

    fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of records held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        entry.updated_at + self.ttl < now
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: SessionId) -> ApiResult<SessionRecord> {
        let entries = self.entries.read().await;
        match entries.get(&id) {
            Some(entry) if self.is_expired(entry, Utc::now()) => {
                debug!(session = %id, "Session expired, starting fresh");
                Ok(SessionRecord::default())
            }
            Some(entry) => Ok(entry.record.clone()),
            None => Ok(SessionRecord::default()),
        }
    }

    async fn save(&self, id: SessionId, record: &SessionRecord) -> ApiResult<()> {
        let entry = Entry {
            record: record.clone(),
            updated_at: Utc::now(),
        };
        self.entries.write().await.insert(id, entry);
        Ok(())
    }

    async fn purge_expired(&self) -> ApiResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));

        let removed = (before - entries.len()) as u64;
        if removed > 0 {
            info!("Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}
