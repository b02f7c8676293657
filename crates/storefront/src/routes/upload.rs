//! Multipart form reading for avatar and gallery uploads.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::error::{AppError, Result};

/// Name of the file field in upload forms.
pub const FILE_FIELD: &str = "file";

/// An uploaded file held in memory.
///
/// The client's file name is not kept; stored names are generated.
#[derive(Debug)]
pub struct UploadedFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus the optional file of a multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    /// Trimmed, non-empty text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Read every field of a multipart form, refusing files over `max_bytes`.
///
/// # Errors
///
/// Returns `AppError::PayloadTooLarge` when the body or file exceeds the
/// limit and `AppError::BadRequest` for malformed forms.
pub async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_ascii_lowercase();
            let bytes = field.bytes().await.map_err(multipart_error)?;

            if bytes.len() > max_bytes {
                return Err(AppError::PayloadTooLarge);
            }
            if bytes.is_empty() {
                continue;
            }

            form.file = Some(UploadedFile {
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(format!("Yanlış forma: {}", e.body_text()))
    }
}
