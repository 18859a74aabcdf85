pub mod ordering;
pub mod record;
pub mod validate;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use ordering::{renumber, sort_records};
pub use record::{Record, RecordError};
pub use validate::{validate_record, ValidationError};

/// A persisted record: one JSON object inside a collection file
pub type RecordMap = Map<String, Value>;

/// The five content collections the site edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    Members,
    MemberClasses,
    Programs,
    News,
    HeroImages,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Members,
        CollectionKind::MemberClasses,
        CollectionKind::Programs,
        CollectionKind::News,
        CollectionKind::HeroImages,
    ];

    /// URL segment used by the admin and public routes
    pub fn slug(&self) -> &'static str {
        match self {
            CollectionKind::Members => "members",
            CollectionKind::MemberClasses => "member-classes",
            CollectionKind::Programs => "programs",
            CollectionKind::News => "news",
            CollectionKind::HeroImages => "hero-images",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            CollectionKind::Members => "members.json",
            CollectionKind::MemberClasses => "member-classes.json",
            CollectionKind::Programs => "programs.json",
            CollectionKind::News => "news.json",
            CollectionKind::HeroImages => "hero-images.json",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.file_name() == name)
    }

    /// Tie-break key for records sharing a `displayOrder`
    pub fn sort_key(&self) -> &'static str {
        match self {
            CollectionKind::Members | CollectionKind::MemberClasses => "name",
            CollectionKind::Programs | CollectionKind::News | CollectionKind::HeroImages => "title",
        }
    }

    /// Whether records carry a manual `displayOrder`
    pub fn is_ordered(&self) -> bool {
        !matches!(self, CollectionKind::News)
    }

    /// Maximum number of records the collection may hold
    pub fn max_records(&self) -> Option<usize> {
        match self {
            CollectionKind::Programs => Some(4),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
