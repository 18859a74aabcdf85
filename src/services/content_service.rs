use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::content::ordering::sort_news;
use crate::content::{
    renumber, sort_records, validate_record, CollectionKind, Record, RecordMap, ValidationError,
};
use crate::error::ApiError;
use crate::storage::{ContentStore, SaveOutcome, StoreError};

/// Records of a collection together with the version they were read at
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub records: Vec<RecordMap>,
    pub version: String,
}

/// Admin-side operations on the content collections, on top of any
/// [`ContentStore`].
///
/// Every read-modify-write runs under one lock, and the save is checked
/// against the version read at the start so writers outside this service
/// surface as a conflict instead of being overwritten.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Load a collection, treating one that was never written as empty
    async fn load_or_empty(&self, kind: CollectionKind) -> Result<Vec<RecordMap>, StoreError> {
        match self.store.load(kind.file_name()).await {
            Ok(records) => Ok(records),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// All records in display order
    pub async fn list(&self, kind: CollectionKind) -> Result<Vec<RecordMap>, ApiError> {
        let mut records = self.load_or_empty(kind).await?;
        if kind.is_ordered() {
            sort_records(&mut records, kind.sort_key());
        } else {
            sort_news(&mut records);
        }
        Ok(records)
    }

    /// Records plus the version a follow-up save can be checked against
    pub async fn snapshot(&self, kind: CollectionKind) -> Result<CollectionSnapshot, ApiError> {
        // Read the version first: a concurrent save in between makes the
        // snapshot look stale, never fresher than it is
        let version = self.store.version(kind.file_name()).await?;
        let records = self.list(kind).await?;
        Ok(CollectionSnapshot { records, version })
    }

    /// Version and records, read in that order, for a follow-up checked save
    async fn load_for_write(
        &self,
        kind: CollectionKind,
    ) -> Result<(Vec<RecordMap>, String), StoreError> {
        let version = self.store.version(kind.file_name()).await?;
        let records = self.load_or_empty(kind).await?;
        Ok((records, version))
    }

    async fn validate(&self, kind: CollectionKind, record: &RecordMap) -> Result<(), ApiError> {
        let member_classes = if kind == CollectionKind::Members {
            self.load_or_empty(CollectionKind::MemberClasses).await?
        } else {
            Vec::new()
        };
        validate_record(kind, record, &member_classes)?;
        Ok(())
    }

    async fn persist(
        &self,
        kind: CollectionKind,
        records: Vec<RecordMap>,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome, ApiError> {
        Ok(self
            .store
            .save(kind.file_name(), records, expected_version)
            .await?)
    }

    /// Add a record with a generated id and default `displayOrder`
    pub async fn create(&self, kind: CollectionKind, payload: Value) -> Result<RecordMap, ApiError> {
        let mut record = Record::from_api_input(payload)?;
        record.stamp_new(kind.is_ordered());
        self.validate(kind, record.as_map()).await?;

        let created = record.into_map();
        let _guard = self.write_lock.lock().await;
        let (mut records, version) = self.load_for_write(kind).await?;
        records.push(created.clone());
        self.persist(kind, records, Some(&version)).await?;

        tracing::info!(collection = %kind, id = ?created.get("id"), "Created record");
        Ok(created)
    }

    /// Merge a partial update into an existing record
    pub async fn update(
        &self,
        kind: CollectionKind,
        id: &str,
        patch: Value,
    ) -> Result<RecordMap, ApiError> {
        let _guard = self.write_lock.lock().await;
        let (mut records, version) = self.load_for_write(kind).await?;
        let position = Self::position(&records, kind, id)?;

        let mut record = Record::from_stored(records[position].clone());
        record.merge_input(patch)?.touch();
        self.validate(kind, record.as_map()).await?;

        let updated = record.into_map();
        records[position] = updated.clone();
        self.persist(kind, records, Some(&version)).await?;

        tracing::info!(collection = %kind, id, "Updated record");
        Ok(updated)
    }

    pub async fn delete(&self, kind: CollectionKind, id: &str) -> Result<RecordMap, ApiError> {
        let _guard = self.write_lock.lock().await;
        let (mut records, version) = self.load_for_write(kind).await?;
        let position = Self::position(&records, kind, id)?;
        let removed = records.remove(position);
        self.persist(kind, records, Some(&version)).await?;

        tracing::info!(collection = %kind, id, "Deleted record");
        Ok(removed)
    }

    /// Persist a manual ordering: `ids` lists every record once, in the new
    /// order, and each `displayOrder` becomes the record's position.
    pub async fn reorder(
        &self,
        kind: CollectionKind,
        ids: &[String],
        expected_version: Option<&str>,
    ) -> Result<CollectionSnapshot, ApiError> {
        if !kind.is_ordered() {
            return Err(ApiError::bad_request(format!("{} has no manual order", kind)));
        }

        let _guard = self.write_lock.lock().await;
        let (records, current_version) = self.load_for_write(kind).await?;
        let mut by_id: HashMap<&str, &RecordMap> = HashMap::new();
        for record in &records {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                by_id.insert(id, record);
            }
        }

        if ids.len() != records.len() || by_id.len() != records.len() {
            return Err(ValidationError::new(format!(
                "Reorder must list each of the {} {} exactly once",
                records.len(),
                kind
            ))
            .into());
        }

        let mut arranged = Vec::with_capacity(ids.len());
        for id in ids {
            let record = by_id
                .remove(id.as_str())
                .ok_or_else(|| ValidationError::field("ids", format!("Unknown or repeated id '{}'", id)))?;
            arranged.push(record.clone());
        }
        renumber(&mut arranged);

        let expected = expected_version.unwrap_or(current_version.as_str());
        let outcome = self.persist(kind, arranged.clone(), Some(expected)).await?;
        tracing::info!(collection = %kind, count = outcome.count, "Reordered collection");
        Ok(CollectionSnapshot {
            records: arranged,
            version: outcome.version,
        })
    }

    /// Members with `memberClassName` resolved from the class collection.
    /// Dangling class ids resolve to nothing.
    pub async fn members_with_classes(&self) -> Result<Vec<RecordMap>, ApiError> {
        let classes = self.load_or_empty(CollectionKind::MemberClasses).await?;
        let names: HashMap<&str, &Value> = classes
            .iter()
            .filter_map(|class| Some((class.get("id")?.as_str()?, class.get("name")?)))
            .collect();

        let mut members = self.list(CollectionKind::Members).await?;
        for member in &mut members {
            let class_name = member
                .get("memberClassId")
                .and_then(Value::as_str)
                .and_then(|id| names.get(id))
                .map(|name| (*name).clone())
                .unwrap_or(Value::Null);
            member.insert("memberClassName".to_string(), class_name);
        }
        Ok(members)
    }

    fn position(records: &[RecordMap], kind: CollectionKind, id: &str) -> Result<usize, ApiError> {
        records
            .iter()
            .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| ApiError::not_found(format!("{} record {} not found", kind, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ordering::display_order;
    use crate::storage::{FileStore, MemoryStore};
    use serde_json::json;

    fn service() -> ContentService {
        ContentService::new(Arc::new(MemoryStore::new()))
    }

    fn id_of(record: &RecordMap) -> String {
        record["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_order() {
        let svc = service();
        let created = svc
            .create(CollectionKind::MemberClasses, json!({"name": "Board"}))
            .await
            .unwrap();
        assert!(created.get("id").is_some());
        assert_eq!(created["displayOrder"], 0);

        let listed = svc.list(CollectionKind::MemberClasses).await.unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_and_system_fields() {
        let svc = service();
        let err = svc
            .create(CollectionKind::News, json!({"title": "No category"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));

        let err = svc
            .create(CollectionKind::MemberClasses, json!({"id": "mine", "name": "Board"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
        assert!(svc.list(CollectionKind::MemberClasses).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_member_role_resolves_through_class() {
        let svc = service();
        let active = svc
            .create(CollectionKind::MemberClasses, json!({"name": "Active Member"}))
            .await
            .unwrap();

        let member = svc
            .create(
                CollectionKind::Members,
                json!({"name": "Ada", "memberClassId": active["id"].clone()}),
            )
            .await
            .unwrap();
        assert!(member.get("role").is_none());

        assert!(svc
            .create(CollectionKind::Members, json!({"name": "Grace"}))
            .await
            .is_err());

        let members = svc.members_with_classes().await.unwrap();
        assert_eq!(members[0]["memberClassName"], "Active Member");
    }

    #[tokio::test]
    async fn test_update_merges_and_delete_removes() {
        let svc = service();
        let program = svc
            .create(
                CollectionKind::Programs,
                json!({"title": "Tutoring", "subtitle": "Weekly", "description": "Math help"}),
            )
            .await
            .unwrap();
        let id = id_of(&program);

        let updated = svc
            .update(CollectionKind::Programs, &id, json!({"subtitle": "Twice weekly"}))
            .await
            .unwrap();
        assert_eq!(updated["subtitle"], "Twice weekly");
        assert_eq!(updated["description"], "Math help");

        let err = svc
            .update(CollectionKind::Programs, &id, json!({"title": ""}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));

        svc.delete(CollectionKind::Programs, &id).await.unwrap();
        assert!(matches!(
            svc.delete(CollectionKind::Programs, &id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fifth_program_is_rejected() {
        let svc = service();
        for title in ["A", "B", "C", "D"] {
            svc.create(CollectionKind::Programs, json!({"title": title})).await.unwrap();
        }
        let err = svc
            .create(CollectionKind::Programs, json!({"title": "E"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnprocessableEntity(_)));
        assert_eq!(svc.list(CollectionKind::Programs).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_reorder_renumbers_positions() {
        let svc = service();
        let mut ids = Vec::new();
        for title in ["First", "Second", "Third"] {
            let hero = svc
                .create(
                    CollectionKind::HeroImages,
                    json!({"title": title, "imageUrl": "/uploads/hero/x-1.png", "altText": title}),
                )
                .await
                .unwrap();
            ids.push(id_of(&hero));
        }
        ids.reverse();

        let snapshot = svc.reorder(CollectionKind::HeroImages, &ids, None).await.unwrap();
        assert_eq!(snapshot.records.len(), 3);

        let listed = svc.list(CollectionKind::HeroImages).await.unwrap();
        let listed_ids: Vec<String> = listed.iter().map(id_of).collect();
        assert_eq!(listed_ids, ids);
        for (index, record) in listed.iter().enumerate() {
            assert_eq!(display_order(record), index as i64);
        }
        assert_eq!(svc.snapshot(CollectionKind::HeroImages).await.unwrap().version, snapshot.version);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_all_persist() {
        let dir = tempfile::tempdir().unwrap();
        let svc = ContentService::new(Arc::new(FileStore::new(dir.path())));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.create(CollectionKind::MemberClasses, json!({ "name": format!("Class {}", i) }))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = FileStore::new(dir.path())
            .load(CollectionKind::MemberClasses.file_name())
            .await
            .unwrap();
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test]
    async fn test_write_from_outside_the_service_is_a_conflict() {
        let svc = service();
        let class = svc.create(CollectionKind::MemberClasses, json!({"name": "Board"})).await.unwrap();

        // Version is read before the records, so a save landing in between
        // fails the checked write instead of being overwritten
        let (records, stale) = svc.load_for_write(CollectionKind::MemberClasses).await.unwrap();
        let mut changed = records;
        changed[0].insert("name".to_string(), json!("Officers"));
        svc.store()
            .save(CollectionKind::MemberClasses.file_name(), changed, None)
            .await
            .unwrap();
        let err = svc
            .persist(CollectionKind::MemberClasses, Vec::new(), Some(&stale))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let listed = svc.list(CollectionKind::MemberClasses).await.unwrap();
        assert_eq!(listed[0]["id"], class["id"]);
        assert_eq!(listed[0]["name"], "Officers");
    }

    #[tokio::test]
    async fn test_reorder_rejects_partial_lists_and_stale_versions() {
        let svc = service();
        let a = svc.create(CollectionKind::MemberClasses, json!({"name": "A"})).await.unwrap();
        let b = svc.create(CollectionKind::MemberClasses, json!({"name": "B"})).await.unwrap();

        let err = svc
            .reorder(CollectionKind::MemberClasses, &[id_of(&a)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));

        let err = svc
            .reorder(CollectionKind::MemberClasses, &[id_of(&a), id_of(&a)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));

        let err = svc
            .reorder(CollectionKind::MemberClasses, &[id_of(&b), id_of(&a)], Some("stale"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = svc.reorder(CollectionKind::News, &[], None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
