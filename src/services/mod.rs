pub mod content_service;

pub use content_service::{CollectionSnapshot, ContentService};
