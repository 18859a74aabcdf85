use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::ordering::DISPLAY_ORDER;
use super::RecordMap;

/// Fields only the service may set, never API input
const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Errors that can occur while building a record from API input
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(&'static str),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// A content record with its working field values.
///
/// Records start either from API input (`from_api_input`, system fields
/// rejected) or from stored data (`from_stored`), and end as a plain
/// `RecordMap` that gets written back to the collection.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: RecordMap,
}

impl Record {
    /// Create record from API input JSON, rejecting system fields
    pub fn from_api_input(json: Value) -> Result<Self, RecordError> {
        let map = Self::input_object(json)?;
        Ok(Self { fields: map })
    }

    /// Wrap a record loaded from the store (system fields allowed)
    pub fn from_stored(fields: RecordMap) -> Self {
        Self { fields }
    }

    fn input_object(json: Value) -> Result<RecordMap, RecordError> {
        match json {
            Value::Object(map) => {
                if let Some(field) = SYSTEM_FIELDS.iter().find(|f| map.contains_key(**f)) {
                    return Err(RecordError::SystemFieldNotAllowed(*field));
                }
                Ok(map)
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Shallow merge of a partial update; fields absent from the patch keep
    /// their prior value.
    pub fn merge_input(&mut self, patch: Value) -> Result<&mut Self, RecordError> {
        let patch = Self::input_object(patch)?;
        for (key, value) in patch {
            self.fields.insert(key, value);
        }
        Ok(self)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    /// Assign identity and timestamps for a freshly created record
    pub fn stamp_new(&mut self, ordered: bool) -> &mut Self {
        let now = Utc::now();
        self.set("id", generate_id(now));
        self.set("createdAt", now.to_rfc3339());
        self.set("updatedAt", now.to_rfc3339());
        if ordered && !self.fields.contains_key(DISPLAY_ORDER) {
            self.set(DISPLAY_ORDER, 0);
        }
        self
    }

    pub fn touch(&mut self) -> &mut Self {
        self.set("updatedAt", Utc::now().to_rfc3339())
    }

    pub fn as_map(&self) -> &RecordMap {
        &self.fields
    }

    pub fn into_map(self) -> RecordMap {
        self.fields
    }
}

/// `<millis>-<8 hex chars>`: sortable by creation time and unique without a counter
pub fn generate_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.timestamp_millis(), &suffix[..8])
}
