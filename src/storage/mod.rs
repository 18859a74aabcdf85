pub mod error;
pub mod file_store;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::content::{sort_records, CollectionKind, RecordMap};

pub use error::StoreError;
pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Version reported for a collection that has never been written
pub const EMPTY_VERSION: &str = "empty";

const COLLECTION_SUFFIX: &str = ".json";

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub count: usize,
    pub version: String,
}

/// Durable read/modify/write of named JSON collections.
///
/// Names are the externally supplied file names (`members.json`); every
/// implementation validates them with [`validate_name`] before touching
/// storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Load a collection; `NotFound` when it has never been written
    async fn load(&self, name: &str) -> Result<Vec<RecordMap>, StoreError>;

    /// Replace a collection with `records`, returning how many were written.
    ///
    /// When `expected_version` is given and the stored version differs, the
    /// save fails with `Conflict` and nothing is written.
    async fn save(
        &self,
        name: &str,
        records: Vec<RecordMap>,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome, StoreError>;

    /// Current version of a collection, [`EMPTY_VERSION`] if absent
    async fn version(&self, name: &str) -> Result<String, StoreError>;
}

/// Reject anything that is not a plain `<stem>.json` file name
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidName(name.to_string());

    let stem = name.strip_suffix(COLLECTION_SUFFIX).ok_or_else(invalid)?;
    if stem.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(invalid());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid());
    }
    Ok(())
}

/// Accept an arbitrary JSON payload as collection content
pub fn records_from_value(content: Value) -> Result<Vec<RecordMap>, StoreError> {
    let Value::Array(items) = content else {
        return Err(StoreError::Serialization(
            "content must be an array of objects".to_string(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Serialization(format!(
                "item {} is not an object",
                index
            ))),
        })
        .collect()
}

/// Hex SHA-256 of a collection's stored bytes
pub fn content_version(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Everything a save does before bytes hit storage: name check, round-trip
/// check, ordering for ordered collections and the cardinality cap.
/// Returns the bytes to write.
pub(crate) fn prepare_save(name: &str, mut records: Vec<RecordMap>) -> Result<Vec<u8>, StoreError> {
    validate_name(name)?;

    let encoded =
        serde_json::to_vec(&records).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let decoded: Vec<RecordMap> =
        serde_json::from_slice(&encoded).map_err(|e| StoreError::Serialization(e.to_string()))?;
    if decoded != records {
        return Err(StoreError::Serialization(
            "payload does not survive a JSON round trip".to_string(),
        ));
    }

    if let Some(kind) = CollectionKind::from_file_name(name) {
        if let Some(limit) = kind.max_records() {
            if records.len() > limit {
                return Err(StoreError::LimitExceeded {
                    collection: name.to_string(),
                    limit,
                    attempted: records.len(),
                });
            }
        }
        if kind.is_ordered() {
            sort_records(&mut records, kind.sort_key());
        }
    }

    serde_json::to_vec_pretty(&records).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Parse stored bytes back into records
pub(crate) fn parse_collection(name: &str, bytes: &[u8]) -> Result<Vec<RecordMap>, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Malformed {
        collection: name.to_string(),
        reason: e.to_string(),
    })
}

/// Fail with `Conflict` unless `expected` (when given) matches `current`
pub(crate) fn check_version(
    name: &str,
    expected: Option<&str>,
    current: &str,
) -> Result<(), StoreError> {
    match expected {
        Some(expected) if expected != current => Err(StoreError::Conflict {
            collection: name.to_string(),
            expected: expected.to_string(),
        }),
        _ => Ok(()),
    }
}
