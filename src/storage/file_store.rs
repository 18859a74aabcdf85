use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    check_version, content_version, parse_collection, prepare_save, validate_name, ContentStore,
    SaveOutcome, StoreError, EMPTY_VERSION,
};
use crate::content::RecordMap;

/// Collections stored as pretty-printed JSON files, one per collection,
/// directly under `root`.
///
/// Saves inside this process are serialized; other processes writing the
/// same directory are not coordinated with.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn load(&self, name: &str) -> Result<Vec<RecordMap>, StoreError> {
        let path = self.path_for(name)?;
        let bytes = Self::read_bytes(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        parse_collection(name, &bytes)
    }

    async fn save(
        &self,
        name: &str,
        records: Vec<RecordMap>,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome, StoreError> {
        let count = records.len();
        let rendered = prepare_save(name, records)?;
        let path = self.path_for(name)?;

        let _guard = self.write_lock.lock().await;

        let current = Self::read_bytes(&path)
            .await?
            .map(|bytes| content_version(&bytes))
            .unwrap_or_else(|| EMPTY_VERSION.to_string());
        check_version(name, expected_version, &current)?;

        tokio::fs::create_dir_all(&self.root).await?;

        // Write beside the target and rename so readers never see a partial file
        let tmp_path = self.root.join(format!(".{}.tmp", name));
        tokio::fs::write(&tmp_path, &rendered).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        let version = content_version(&rendered);
        info!(collection = name, count, version = %version, "Saved collection");
        Ok(SaveOutcome { count, version })
    }

    async fn version(&self, name: &str) -> Result<String, StoreError> {
        let path = self.path_for(name)?;
        let version = Self::read_bytes(&path)
            .await?
            .map(|bytes| content_version(&bytes))
            .unwrap_or_else(|| EMPTY_VERSION.to_string());
        debug!(collection = name, version = %version, "Read collection version");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(v: Value) -> Vec<RecordMap> {
        super::super::records_from_value(v).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let content = records(json!([
            {"key": "hours", "value": "9-5", "nested": {"list": [1, 2.5, null, true]}},
            {"key": "email", "value": "club@example.edu"}
        ]));
        let outcome = store.save("settings.json", content.clone(), None).await.unwrap();
        assert_eq!(outcome.count, 2);

        let loaded = store.load("settings.json").await.unwrap();
        assert_eq!(loaded, content);

        let on_disk = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(on_disk.contains("\n  {"), "expected pretty-printed JSON: {}", on_disk);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(store.load("news.json").await, Err(StoreError::NotFound(_))));
        assert_eq!(store.version("news.json").await.unwrap(), EMPTY_VERSION);

        std::fs::write(dir.path().join("news.json"), b"{\"not\": \"an array\"}").unwrap();
        assert!(matches!(store.load("news.json").await, Err(StoreError::Malformed { .. })));

        std::fs::write(dir.path().join("members.json"), b"[1, 2]").unwrap();
        assert!(matches!(store.load("members.json").await, Err(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_names_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));

        for name in ["../escape.json", "sub/dir.json", "notes.txt"] {
            let err = store.save(name, Vec::new(), None).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidName(_)), "{}: {:?}", name, err);
        }
        assert!(!dir.path().join("escape.json").exists());
        assert!(!dir.path().join("data").exists());
    }

    #[tokio::test]
    async fn test_program_cap_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let four = records(json!([
            {"title": "Tutoring"}, {"title": "Mentoring"}, {"title": "Outreach"}, {"title": "Socials"}
        ]));
        assert_eq!(store.save("programs.json", four, None).await.unwrap().count, 4);
        let before = std::fs::read(dir.path().join("programs.json")).unwrap();

        let five = records(json!([
            {"title": "A"}, {"title": "B"}, {"title": "C"}, {"title": "D"}, {"title": "E"}
        ]));
        let err = store.save("programs.json", five, None).await.unwrap_err();
        assert!(matches!(err, StoreError::LimitExceeded { .. }));
        assert_eq!(std::fs::read(dir.path().join("programs.json")).unwrap(), before);
    }

    #[tokio::test]
    async fn test_ordered_collections_are_sorted_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let members = records(json!([
            {"name": "Zoe", "displayOrder": 1},
            {"name": "Bob", "displayOrder": 0},
            {"name": "Alice", "displayOrder": 0}
        ]));
        store.save("members.json", members, None).await.unwrap();

        let loaded = store.load("members.json").await.unwrap();
        let names: Vec<&str> = loaded.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Zoe"]);
    }

    #[tokio::test]
    async fn test_second_save_replaces_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store
            .save("member-classes.json", records(json!([{"id": "c1", "name": "Board", "description": "Officers"}])), None)
            .await
            .unwrap();
        store
            .save("member-classes.json", records(json!([{"id": "c1", "name": "Board"}])), None)
            .await
            .unwrap();

        let loaded = store.load("member-classes.json").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].get("description").is_none());
    }

    #[tokio::test]
    async fn test_version_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let first = store
            .save("news.json", records(json!([{"title": "One"}])), Some(EMPTY_VERSION))
            .await
            .unwrap();
        assert_eq!(store.version("news.json").await.unwrap(), first.version);

        // stale writer loses
        let err = store
            .save("news.json", records(json!([{"title": "Stale"}])), Some(EMPTY_VERSION))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.load("news.json").await.unwrap()[0]["title"], "One");

        // current writer wins
        let second = store
            .save("news.json", records(json!([{"title": "Two"}])), Some(&first.version))
            .await
            .unwrap();
        assert_ne!(second.version, first.version);
    }
}
