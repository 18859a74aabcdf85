use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::utils::{output_success, parse_collection};
use crate::cli::OutputFormat;
use crate::content::{validate_record, CollectionKind, RecordMap};
use crate::storage::{ContentStore, FileStore, StoreError};

/// One thing wrong with a collection file
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub collection: &'static str,
    pub id: Option<String>,
    pub message: String,
}

impl Problem {
    fn file(kind: CollectionKind, message: impl Into<String>) -> Self {
        Self {
            collection: kind.slug(),
            id: None,
            message: message.into(),
        }
    }
}

pub async fn handle(
    collection: Option<&str>,
    store: &FileStore,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let kinds = match collection {
        Some(name) => vec![parse_collection(name)?],
        None => CollectionKind::ALL.to_vec(),
    };

    let problems = check_collections(store, &kinds).await;
    if problems.is_empty() {
        return output_success(
            output_format,
            &format!("{} collection(s) passed", kinds.len()),
            Some(json!({ "problems": [] })),
        );
    }

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "success": false, "problems": problems }))?
            );
        }
        OutputFormat::Text => {
            for problem in &problems {
                match &problem.id {
                    Some(id) => eprintln!("{} [{}]: {}", problem.collection, id, problem.message),
                    None => eprintln!("{}: {}", problem.collection, problem.message),
                }
            }
        }
    }
    anyhow::bail!("{} problem(s) found", problems.len())
}

/// Validate every record of the given collections. Missing files are fine;
/// unreadable ones are reported as a single problem.
pub async fn check_collections(store: &FileStore, kinds: &[CollectionKind]) -> Vec<Problem> {
    let mut problems = Vec::new();

    // Members need the classes to resolve the role exemption
    let member_classes = match store.load(CollectionKind::MemberClasses.file_name()).await {
        Ok(classes) => classes,
        Err(StoreError::NotFound(_)) => Vec::new(),
        Err(e) => {
            if kinds.contains(&CollectionKind::Members) {
                problems.push(Problem::file(
                    CollectionKind::Members,
                    format!("cannot resolve member classes: {}", e),
                ));
            }
            Vec::new()
        }
    };

    for &kind in kinds {
        let records = match store.load(kind.file_name()).await {
            Ok(records) => records,
            Err(StoreError::NotFound(_)) => continue,
            Err(e) => {
                problems.push(Problem::file(kind, e.to_string()));
                continue;
            }
        };

        if let Some(limit) = kind.max_records() {
            if records.len() > limit {
                problems.push(Problem::file(
                    kind,
                    format!("holds {} records, at most {} allowed", records.len(), limit),
                ));
            }
        }

        problems.extend(check_records(kind, &records, &member_classes));
    }
    problems
}

fn check_records(
    kind: CollectionKind,
    records: &[RecordMap],
    member_classes: &[RecordMap],
) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let id = record.get("id").and_then(Value::as_str).map(str::to_string);
        let label = id.clone().unwrap_or_else(|| format!("#{}", index));

        match &id {
            None => problems.push(Problem {
                collection: kind.slug(),
                id: Some(label.clone()),
                message: "record has no id".to_string(),
            }),
            Some(id) if !seen.insert(id.clone()) => problems.push(Problem {
                collection: kind.slug(),
                id: Some(label.clone()),
                message: "duplicate id".to_string(),
            }),
            Some(_) => {}
        }

        if let Err(e) = validate_record(kind, record, member_classes) {
            for (field, problem) in &e.field_errors {
                problems.push(Problem {
                    collection: kind.slug(),
                    id: Some(label.clone()),
                    message: format!("{}: {}", field, problem),
                });
            }
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_reports_record_problems() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("programs.json"),
            serde_json::to_vec(&json!([
                { "id": "p1", "title": "Robotics" },
                { "id": "p1", "title": "" },
                { "title": "No id" }
            ]))
            .unwrap(),
        )
        .await
        .unwrap();
        tokio::fs::write(dir.path().join("news.json"), b"{ not json").await.unwrap();

        let store = FileStore::new(dir.path());
        let problems = check_collections(&store, &CollectionKind::ALL).await;

        let messages: Vec<String> = problems
            .iter()
            .map(|p| format!("{}|{}|{}", p.collection, p.id.as_deref().unwrap_or(""), p.message))
            .collect();
        assert!(messages.contains(&"programs|p1|duplicate id".to_string()));
        assert!(messages.contains(&"programs|p1|title: This field is required".to_string()));
        assert!(messages.contains(&"programs|#2|record has no id".to_string()));
        assert!(problems.iter().any(|p| p.collection == "news" && p.id.is_none()));
        assert!(!problems.iter().any(|p| p.collection == "members"));
    }

    #[tokio::test]
    async fn test_unreadable_classes_are_reported_for_members() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("member-classes.json"), b"[oops").await.unwrap();
        tokio::fs::write(
            dir.path().join("members.json"),
            serde_json::to_vec(&json!([{ "id": "m1", "name": "Ada", "role": "Chair" }])).unwrap(),
        )
        .await
        .unwrap();

        let store = FileStore::new(dir.path());
        let problems = check_collections(&store, &[CollectionKind::Members]).await;
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].collection, "members");
        assert!(problems[0].id.is_none());
        assert!(problems[0].message.starts_with("cannot resolve member classes"));
    }

    #[tokio::test]
    async fn test_check_passes_on_empty_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(check_collections(&store, &CollectionKind::ALL).await.is_empty());
    }
}
