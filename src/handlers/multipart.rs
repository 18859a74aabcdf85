use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::uploads::{IncomingFile, UploadError};

/// Multipart field the upload endpoints read the file from
pub const FILE_FIELD: &str = "file";

/// Body-limit rejections surface as the upload ceiling, everything else as
/// a malformed request
fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge { max: max_bytes }.into()
    } else {
        ApiError::bad_request(format!("Invalid multipart request: {}", e.body_text()))
    }
}

/// Pull the `file` field out of a multipart body, stopping as soon as it
/// grows past `max_bytes`. `Ok(None)` when the form has no such field.
pub async fn read_file_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Option<(IncomingFile, Vec<u8>)>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let incoming = IncomingFile {
            original_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(str::to_string),
        };

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?
        {
            if data.len() + chunk.len() > max_bytes {
                tracing::warn!(
                    original_name = %incoming.original_name,
                    "Upload exceeded {} bytes, aborting",
                    max_bytes
                );
                return Err(UploadError::FileTooLarge { max: max_bytes }.into());
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Some((incoming, data)));
    }

    Ok(None)
}
