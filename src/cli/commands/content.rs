use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_records, output_success, parse_collection};
use crate::cli::OutputFormat;
use crate::content::{renumber, sort_records, CollectionKind, RecordMap};
use crate::content::ordering::sort_news;
use crate::storage::{ContentStore, FileStore, StoreError};

#[derive(Subcommand)]
pub enum ContentCommands {
    #[command(about = "List records in display order")]
    List {
        #[arg(help = "Collection name (e.g. members, programs)")]
        collection: String,
    },

    #[command(about = "Show one record as JSON")]
    Show {
        #[arg(help = "Collection name")]
        collection: String,
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Rewrite displayOrder as 0..n following the current order")]
    Renumber {
        #[arg(help = "Collection name")]
        collection: String,
    },

    #[command(about = "Print the collection version used for conflict checks")]
    Version {
        #[arg(help = "Collection name")]
        collection: String,
    },
}

pub async fn handle(
    cmd: ContentCommands,
    store: &FileStore,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ContentCommands::List { collection } => {
            let kind = parse_collection(&collection)?;
            let records = load_sorted(store, kind).await?;
            output_records(output_format, kind, &records)
        }
        ContentCommands::Show { collection, id } => {
            let kind = parse_collection(&collection)?;
            let records = load_sorted(store, kind).await?;
            let record = records
                .into_iter()
                .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .with_context(|| format!("no record '{}' in {}", id, kind))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        ContentCommands::Renumber { collection } => {
            let kind = parse_collection(&collection)?;
            let outcome = renumber_collection(store, kind).await?;
            output_success(
                output_format,
                &format!("Renumbered {} record(s) in {}", outcome.0, kind),
                Some(json!({ "count": outcome.0, "version": outcome.1 })),
            )
        }
        ContentCommands::Version { collection } => {
            let kind = parse_collection(&collection)?;
            let version = store.version(kind.file_name()).await?;
            output_success(
                output_format,
                &format!("{} is at version {}", kind, version),
                Some(json!({ "version": version })),
            )
        }
    }
}

async fn load_or_empty(store: &FileStore, kind: CollectionKind) -> anyhow::Result<Vec<RecordMap>> {
    match store.load(kind.file_name()).await {
        Ok(records) => Ok(records),
        Err(StoreError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", kind.file_name())),
    }
}

async fn load_sorted(store: &FileStore, kind: CollectionKind) -> anyhow::Result<Vec<RecordMap>> {
    let mut records = load_or_empty(store, kind).await?;
    if kind.is_ordered() {
        sort_records(&mut records, kind.sort_key());
    } else {
        sort_news(&mut records);
    }
    Ok(records)
}

/// Close gaps and duplicates in `displayOrder`, keeping the current order.
/// Returns the record count and the new version.
pub async fn renumber_collection(
    store: &FileStore,
    kind: CollectionKind,
) -> anyhow::Result<(usize, String)> {
    if !kind.is_ordered() {
        anyhow::bail!("{} has no manual order", kind);
    }

    let version = store.version(kind.file_name()).await?;
    let mut records = load_sorted(store, kind).await?;
    renumber(&mut records);
    let outcome = store
        .save(kind.file_name(), records, Some(&version))
        .await
        .with_context(|| format!("failed to save {}", kind.file_name()))?;
    Ok((outcome.count, outcome.version))
}
