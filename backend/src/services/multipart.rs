//! Buffered reading of `multipart/form-data` uploads.

use crate::error::ServiceError;
use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;
use std::collections::HashMap;

/// Uploads larger than this are refused.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// The `file` part plus every other part as text.
#[derive(Debug, Default)]
pub struct FormParts {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl FormParts {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn malformed(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Validation(format!("malformed multipart body: {e}"))
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, ServiceError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::Validation("upload is too large".into()));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

pub async fn read_form(mut payload: Multipart) -> Result<FormParts, ServiceError> {
    let mut parts = FormParts::default();
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
            .unwrap_or_default();

        if name == "file" {
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename().map(|f| f.to_string()));
            let bytes = read_field(&mut field).await?;
            parts.file = Some(UploadedFile { filename, bytes });
        } else if !name.is_empty() {
            let bytes = read_field(&mut field).await?;
            let value = String::from_utf8(bytes)
                .map_err(|_| ServiceError::Validation(format!("field {name} is not valid UTF-8")))?;
            parts.fields.insert(name, value);
        }
    }
    Ok(parts)
}
