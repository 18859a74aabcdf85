use thiserror::Error;

/// Errors from reading or writing a collection
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid collection name: {0}")]
    InvalidName(String),

    #[error("Payload is not serializable: {0}")]
    Serialization(String),

    #[error("Collection {collection} holds at most {limit} records, got {attempted}")]
    LimitExceeded {
        collection: String,
        limit: usize,
        attempted: usize,
    },

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Collection {collection} is malformed: {reason}")]
    Malformed { collection: String, reason: String },

    #[error("Collection {collection} changed since version {expected}")]
    Conflict { collection: String, expected: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
