//! Session form state and the namespaced merge
//!
//! Every write into session state goes through [`merge`]: a shallow,
//! non-destructive merge at namespace level. Keys written by one page are
//! never removed by a write from another page.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::PROTOTYPE_BUCKET;

/// JSON object map used for state and partial updates
pub type StateMap = Map<String, Value>;

/// Merge `partial` into `existing[namespace]`
///
/// `result[namespace] = { ...existing[namespace], ...partial }`; all other
/// top-level keys pass through unchanged. A missing or non-object namespace
/// is treated as empty. Total, idempotent, and commutative for updates with
/// disjoint keys.
pub fn merge(existing: &StateMap, namespace: &str, partial: &StateMap) -> StateMap {
    let mut bucket = match existing.get(namespace) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in partial {
        bucket.insert(key.clone(), value.clone());
    }

    let mut next = existing.clone();
    next.insert(namespace.to_string(), Value::Object(bucket));
    next
}

/// Form state for one session: page answers at the top level plus the
/// reserved [`PROTOTYPE_BUCKET`] namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(StateMap);

impl FormState {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: StateMap) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &StateMap {
        &self.0
    }

    pub fn into_map(self) -> StateMap {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Top-level string answer, ignoring blanks
    pub fn answer(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Top-level yes/no answer
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// The auxiliary bucket, if one has been written
    pub fn bucket(&self) -> Option<&StateMap> {
        self.0.get(PROTOTYPE_BUCKET).and_then(Value::as_object)
    }

    /// A non-null value from the auxiliary bucket
    pub fn bucket_value(&self, key: &str) -> Option<&Value> {
        self.bucket()
            .and_then(|bucket| bucket.get(key))
            .filter(|value| !value.is_null())
    }

    /// Merge into an arbitrary namespace
    pub fn merge_namespace(&self, namespace: &str, partial: &StateMap) -> FormState {
        FormState(merge(&self.0, namespace, partial))
    }

    /// Merge into the auxiliary bucket, keeping its sibling keys
    pub fn merge_bucket(&self, partial: &StateMap) -> FormState {
        self.merge_namespace(PROTOTYPE_BUCKET, partial)
    }

    /// Merge page answers into the top level
    ///
    /// The bucket key is never taken from a page answer update, so a page
    /// write cannot replace auxiliary data.
    pub fn merge_answers(&self, partial: &StateMap) -> FormState {
        let mut next = self.0.clone();
        for (key, value) in partial {
            if key == PROTOTYPE_BUCKET {
                warn!("Ignoring page answer targeting reserved namespace {}", PROTOTYPE_BUCKET);
                continue;
            }
            next.insert(key.clone(), value.clone());
        }
        FormState(next)
    }
}
