//! Session identity, session stores and the merging state writer
//!
//! A visitor is identified by a UUID held in a cookie. Each session owns one
//! [`SessionRecord`]: the wizard's form state plus completed submissions.
//!
//! All writes go through [`SessionStates::apply`], which re-reads the stored
//! record and merges the update into it before saving. Concurrent requests
//! for one session are not locked against each other; because every write is
//! a merge, the later write wins only for keys it touches.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use nrf_common::state::StateMap;
use nrf_common::submission::Submission;
use nrf_common::FormState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Opaque per-visitor session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything stored for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    pub form: FormState,
    pub submissions: Vec<Submission>,
    pub last_submission_id: Option<String>,
}

/// Key/value store of session records
///
/// Loading an unknown or expired session yields an empty record, never an
/// error. Each save restarts the session's TTL.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: SessionId) -> ApiResult<SessionRecord>;
    async fn save(&self, id: SessionId, record: &SessionRecord) -> ApiResult<()>;

    /// Delete sessions idle for longer than the TTL; returns how many went
    async fn purge_expired(&self) -> ApiResult<u64>;
}

/// Session TTL from the configured hour count
pub(crate) fn ttl_from_hours(hours: u64) -> ApiResult<chrono::Duration> {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .ok_or_else(|| ApiError::Session(format!("session ttl too large: {}h", hours)))
}

/// A write against one session
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// Merge into the auxiliary bucket
    Bucket(StateMap),
    /// Merge page answers into the top level, preserving the bucket
    Answers(StateMap),
    /// Record a completed submission and start a fresh form
    Submit(Submission),
}

impl StateUpdate {
    fn apply_to(self, record: &mut SessionRecord) {
        match self {
            StateUpdate::Bucket(partial) => record.form = record.form.merge_bucket(&partial),
            StateUpdate::Answers(partial) => record.form = record.form.merge_answers(&partial),
            StateUpdate::Submit(submission) => {
                record.last_submission_id = Some(submission.id.clone());
                record.submissions.push(submission);
                record.form = FormState::new();
            }
        }
    }
}

/// Session store wrapped with read-modify-write merging
#[derive(Clone)]
pub struct SessionStates {
    store: Arc<dyn SessionStore>,
}

impl SessionStates {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, id: SessionId) -> ApiResult<SessionRecord> {
        self.store.load(id).await
    }

    pub async fn form_state(&self, id: SessionId) -> ApiResult<FormState> {
        Ok(self.store.load(id).await?.form)
    }

    /// Load, merge `update` into the stored record, save
    pub async fn apply(&self, id: SessionId, update: StateUpdate) -> ApiResult<SessionRecord> {
        let mut record = self.store.load(id).await?;
        let kind = match &update {
            StateUpdate::Bucket(_) => "bucket",
            StateUpdate::Answers(_) => "answers",
            StateUpdate::Submit(_) => "submission",
        };
        update.apply_to(&mut record);
        self.store.save(id, &record).await?;
        debug!(session = %id, kind, "Session state updated");
        Ok(record)
    }
}

/// Read the session id from the request cookies
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| SessionId::parse(value))
}

/// Attach a [`SessionId`] extension to every request
///
/// Visitors without a valid session cookie get a fresh id and a
/// `Set-Cookie` header on the response.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.cookie_name.as_str();
    let (session, is_new) = match session_id_from_headers(request.headers(), cookie_name) {
        Some(id) => (id, false),
        None => (SessionId::new(), true),
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if is_new {
        info!(session = %session, "Started new session");
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cookie_name, session);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> StateMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_session_id_from_headers() {
        let id = SessionId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; nrf-quote-session={}; other=1", id)).unwrap(),
        );

        assert_eq!(session_id_from_headers(&headers, "nrf-quote-session"), Some(id));
        assert_eq!(session_id_from_headers(&headers, "missing"), None);
    }

    #[test]
    fn test_invalid_session_cookie_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("nrf-quote-session=not-a-uuid"));
        assert_eq!(session_id_from_headers(&headers, "nrf-quote-session"), None);
    }

    #[tokio::test]
    async fn test_apply_merges_without_clobbering() {
        let states = SessionStates::new(Arc::new(MemorySessionStore::new()));
        let id = SessionId::new();

        states
            .apply(id, StateUpdate::Bucket(map(json!({ "boundaryFile": { "filename": "a.json" } }))))
            .await
            .unwrap();
        states
            .apply(id, StateUpdate::Bucket(map(json!({ "buildingType-1": 2 }))))
            .await
            .unwrap();
        states
            .apply(id, StateUpdate::Answers(map(json!({ "email": "a@b.com" }))))
            .await
            .unwrap();

        let form = states.form_state(id).await.unwrap();
        assert_eq!(form.bucket_value("boundaryFile").unwrap()["filename"], "a.json");
        assert_eq!(form.bucket_value("buildingType-1"), Some(&json!(2)));
        assert_eq!(form.answer("email"), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_submit_appends_and_clears_form() {
        let states = SessionStates::new(Arc::new(MemorySessionStore::new()));
        let id = SessionId::new();
        states
            .apply(id, StateUpdate::Answers(map(json!({ "email": "a@b.com" }))))
            .await
            .unwrap();

        let submission = Submission {
            id: "NRF-1-AAAAAA".to_string(),
            date: "2026-10-17T12:00:00.000Z".to_string(),
            form_name: "Nature Restoration Fund Quote".to_string(),
            form_data: Default::default(),
        };
        let record = states.apply(id, StateUpdate::Submit(submission)).await.unwrap();

        assert!(record.form.is_empty());
        assert_eq!(record.submissions.len(), 1);
        assert_eq!(record.last_submission_id.as_deref(), Some("NRF-1-AAAAAA"));
    }
}
