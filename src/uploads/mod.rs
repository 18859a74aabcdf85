//! Image uploads saved under `<upload_root>/<category>/` and served at
//! `/uploads/<category>/<file>`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Public URL prefix uploads are served from
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Default ceiling (5MB)
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp", "gif"];

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File too large. Maximum size is {max} bytes")]
    FileTooLarge { max: usize },

    #[error("Unsupported file type: {0}")]
    InvalidFileType(String),

    #[error("invalid file path")]
    InvalidPath(String),

    #[error("file not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Subdirectory an upload lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Members,
    News,
    Hero,
    Programs,
    Misc,
}

impl Category {
    /// Unrecognized or missing tags fall back to `misc`
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("members") => Category::Members,
            Some("news") => Category::News,
            Some("hero") => Category::Hero,
            Some("programs") => Category::Programs,
            _ => Category::Misc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Members => "members",
            Category::News => "news",
            Category::Hero => "hero",
            Category::Programs => "programs",
            Category::Misc => "misc",
        }
    }
}

/// What the client told us about the file
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: Option<String>,
}

/// Lowercased extension of `name` when it is one of the allowed image types
fn allowed_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn allowed_mime(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|ct| ALLOWED_MIME_TYPES.contains(&ct.as_str()))
}

/// Both the declared content type and the extension must be image types.
/// Returns the normalized extension.
pub fn check_file_type(file: &IncomingFile) -> Result<String, UploadError> {
    let ext = allowed_extension(&file.original_name);
    match ext {
        Some(ext) if allowed_mime(file.content_type.as_deref()) => Ok(ext),
        _ => Err(UploadError::InvalidFileType(format!(
            "{} ({})",
            file.original_name,
            file.content_type.as_deref().unwrap_or("no content type")
        ))),
    }
}

/// Lowercase, separator-safe slug of a file's base name
pub fn slugify(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "file".to_string()
    } else {
        slug.to_string()
    }
}

/// Validated, size-checked upload destination rooted at one directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn check_size(&self, len: usize) -> Result<(), UploadError> {
        if len > self.max_bytes {
            return Err(UploadError::FileTooLarge { max: self.max_bytes });
        }
        Ok(())
    }

    /// Validate and persist one file, returning its public path
    pub async fn save(
        &self,
        category: Category,
        file: &IncomingFile,
        data: &[u8],
    ) -> Result<String, UploadError> {
        self.check_size(data.len())?;
        let ext = check_file_type(file)?;

        let dir = self.root.join(category.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let slug = slugify(&file.original_name);
        let mut timestamp = Utc::now().timestamp_millis();

        // Same name in the same millisecond: move to the next free timestamp
        loop {
            let filename = format!("{}-{}.{}", slug, timestamp, ext);
            let path = dir.join(&filename);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut out) => {
                    out.write_all(data).await?;
                    out.flush().await?;
                    tracing::info!(
                        original_name = %file.original_name,
                        category = category.as_str(),
                        size = data.len(),
                        "Stored upload {}",
                        filename
                    );
                    return Ok(format!("{}{}/{}", PUBLIC_PREFIX, category.as_str(), filename));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => timestamp += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Map a public path onto the upload root without touching the filesystem
    pub fn resolve(&self, public_path: &str) -> Result<PathBuf, UploadError> {
        let invalid = || UploadError::InvalidPath(public_path.to_string());

        let relative = public_path.strip_prefix(PUBLIC_PREFIX).ok_or_else(invalid)?;
        if relative.is_empty() || relative.contains('\\') {
            return Err(invalid());
        }
        if relative.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
            return Err(invalid());
        }
        let relative = Path::new(relative);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(invalid());
        }
        Ok(self.root.join(relative))
    }

    /// Remove a previously uploaded file. Records still pointing at it are
    /// left as they are.
    pub async fn delete(&self, public_path: &str) -> Result<(), UploadError> {
        let path = self.resolve(public_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Deleted upload {}", public_path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(UploadError::NotFound(public_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
