//! Session records and their storage keys.
//!
//! A record is a schemaless JSON object. It is stored as JSON text under
//! `{prefix}_{group_id}_{token}` with no lifetime; a later write with the
//! same key replaces it silently.

use crate::config::{GateError, Result};
use crate::store::KvStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

pub const MISSING_GROUP_ID: &str = "group_id is missing in the request body";

/// Published meeting session: `group_id`, `token` and free-form fields
/// such as `topic`, `start_time`, `duration` and `join_url`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord(Map<String, Value>);

impl SessionRecord {
    /// Parses a write-request body.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Serialization` for malformed JSON and
    /// `GateError::Validation` when the body is valid JSON but not an object.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        match serde_json::from_slice(body)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(GateError::Validation(MISSING_GROUP_ID.to_string())),
        }
    }

    /// Group identifier as used in the storage key.
    ///
    /// Non-empty strings are taken verbatim and numbers in their JSON form.
    /// Anything else counts as missing.
    #[must_use]
    pub fn group_id(&self) -> Option<String> {
        match self.0.get("group_id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.0.get("token").and_then(Value::as_str)
    }

    pub fn set_token(&mut self, token: &str) {
        self.0
            .insert("token".to_string(), Value::String(token.to_string()));
    }

    /// Display form of a field: strings unquoted, other values as JSON text.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for SessionRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Composite key `{prefix}_{group_id}_{token}`.
///
/// Distinct `(group_id, token)` pairs give distinct keys only as long as
/// neither part contains the separator; there is no collision detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    #[must_use]
    pub fn new(prefix: &str, group_id: &str, token: &str) -> Self {
        Self(format!("{prefix}_{group_id}_{token}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session records over a shared `KvStore`.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KvStore>,
    prefix: String,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn key_for(&self, group_id: &str, token: &str) -> StorageKey {
        StorageKey::new(&self.prefix, group_id, token)
    }

    /// Serializes and stores `record` under `key` with no expiry.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Serialization` or `GateError::Store`.
    pub async fn put(&self, key: &StorageKey, record: &SessionRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        self.kv.put(key.as_str(), payload, None).await
    }

    /// Loads the record under `key`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Store` on backend failure and
    /// `GateError::Serialization` if the stored value is not a JSON object.
    pub async fn get(&self, key: &StorageKey) -> Result<Option<SessionRecord>> {
        match self.kv.get(key.as_str()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
