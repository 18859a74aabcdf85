use std::collections::BTreeMap;

use serde_json::Value;

use super::ordering::DISPLAY_ORDER;
use super::{CollectionKind, RecordMap};

/// Class name that exempts a member from needing a role
pub const ACTIVE_MEMBER_CLASS: &str = "Active Member";

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn field(field: &str, problem: impl Into<String>) -> Self {
        let mut err = Self::new(format!("Invalid field: {}", field));
        err.field_errors.insert(field.to_string(), problem.into());
        err
    }
}

fn is_blank(record: &RecordMap, field: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Null) | None => true,
        Some(_) => false,
    }
}

fn required_fields(kind: CollectionKind) -> &'static [&'static str] {
    match kind {
        CollectionKind::Members => &["name"],
        CollectionKind::MemberClasses => &["name"],
        CollectionKind::Programs => &["title"],
        CollectionKind::News => &["title", "category", "description"],
        CollectionKind::HeroImages => &["imageUrl", "altText"],
    }
}

fn boolean_fields(kind: CollectionKind) -> &'static [&'static str] {
    match kind {
        CollectionKind::Members | CollectionKind::HeroImages => &["isActive"],
        CollectionKind::News => &["isPublished"],
        CollectionKind::MemberClasses | CollectionKind::Programs => &[],
    }
}

/// Whether the member's `memberClassId` points at the "Active Member" class
fn in_active_member_class(record: &RecordMap, member_classes: &[RecordMap]) -> bool {
    let Some(class_id) = record.get("memberClassId").filter(|v| !v.is_null()) else {
        return false;
    };
    member_classes.iter().any(|class| {
        class.get("id") == Some(class_id)
            && class.get("name").and_then(Value::as_str) == Some(ACTIVE_MEMBER_CLASS)
    })
}

/// Check a record's shape and required fields for its collection.
///
/// `member_classes` is only consulted for members, to resolve the role
/// exemption; pass an empty slice elsewhere.
pub fn validate_record(
    kind: CollectionKind,
    record: &RecordMap,
    member_classes: &[RecordMap],
) -> Result<(), ValidationError> {
    let mut field_errors = BTreeMap::new();

    for field in required_fields(kind) {
        if is_blank(record, field) {
            field_errors.insert(field.to_string(), "This field is required".to_string());
        }
    }

    if kind == CollectionKind::Members
        && is_blank(record, "role")
        && !in_active_member_class(record, member_classes)
    {
        field_errors.insert(
            "role".to_string(),
            format!("Role is required unless the member is in the '{}' class", ACTIVE_MEMBER_CLASS),
        );
    }

    if kind.is_ordered() {
        match record.get(DISPLAY_ORDER) {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => {}
            Some(Value::String(s)) if s.trim().parse::<i64>().is_ok() => {}
            Some(_) => {
                field_errors.insert(DISPLAY_ORDER.to_string(), "Must be an integer".to_string());
            }
        }
    }

    for field in boolean_fields(kind) {
        if let Some(value) = record.get(*field) {
            if !value.is_boolean() && !value.is_null() {
                field_errors.insert(field.to_string(), "Must be true or false".to_string());
            }
        }
    }

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            message: format!("Invalid {} record", kind),
            field_errors,
        })
    }
}
