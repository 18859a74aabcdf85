use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    check_version, content_version, parse_collection, prepare_save, validate_name, ContentStore,
    SaveOutcome, StoreError, EMPTY_VERSION,
};
use crate::content::RecordMap;

/// In-process store keeping each collection's rendered bytes.
/// Same validation, ordering and versioning as [`super::FileStore`].
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Vec<RecordMap>, StoreError> {
        validate_name(name)?;
        let collections = self.collections.read().await;
        let bytes = collections
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        parse_collection(name, bytes)
    }

    async fn save(
        &self,
        name: &str,
        records: Vec<RecordMap>,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome, StoreError> {
        let count = records.len();
        let rendered = prepare_save(name, records)?;

        let mut collections = self.collections.write().await;
        let current = collections
            .get(name)
            .map(|bytes| content_version(bytes))
            .unwrap_or_else(|| EMPTY_VERSION.to_string());
        check_version(name, expected_version, &current)?;

        let version = content_version(&rendered);
        collections.insert(name.to_string(), rendered);
        Ok(SaveOutcome { count, version })
    }

    async fn version(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        Ok(self
            .collections
            .read()
            .await
            .get(name)
            .map(|bytes| content_version(bytes))
            .unwrap_or_else(|| EMPTY_VERSION.to_string()))
    }
}
