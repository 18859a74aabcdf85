use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::content::{CollectionKind, RecordMap};

/// Resolve a collection from its slug (`member-classes`) or file name
/// (`member-classes.json`)
pub fn parse_collection(name: &str) -> anyhow::Result<CollectionKind> {
    CollectionKind::from_slug(name)
        .or_else(|| CollectionKind::from_file_name(name))
        .ok_or_else(|| {
            let known: Vec<&str> = CollectionKind::ALL.iter().map(|k| k.slug()).collect();
            anyhow::anyhow!("unknown collection '{}' (expected one of: {})", name, known.join(", "))
        })
}

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// One line per record: position, id and display label
pub fn output_records(
    output_format: OutputFormat,
    kind: CollectionKind,
    records: &[RecordMap],
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No records in {}", kind);
                return Ok(());
            }

            println!("{:<6} {:<24} {}", "ORDER", "ID", kind.sort_key().to_uppercase());
            for record in records {
                let order = record
                    .get("displayOrder")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "-".to_string());
                let id = record.get("id").and_then(Value::as_str).unwrap_or("-");
                let label = record
                    .get(kind.sort_key())
                    .and_then(Value::as_str)
                    .unwrap_or("");
                println!("{:<6} {:<24} {}", order, id, label);
            }
            println!("\n{} record(s)", records.len());
        }
    }
    Ok(())
}
