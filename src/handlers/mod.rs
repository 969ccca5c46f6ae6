// handlers/mod.rs - Three security tiers
//
// Public (no auth) -> Protected (bearer token) -> Elevated (bearer token + admin role)

pub mod public; // Tier 1: /, /health, /api/auth/register, /api/auth/login
pub mod protected; // Tier 2: /api/* for any authenticated user
pub mod elevated; // Tier 3: /api/admin/*

use axum::{body::Bytes, extract::Multipart};

use crate::error::ApiError;

/// The single file part of a multipart upload.
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Reads the part named `file`; other parts are skipped.
pub async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read uploaded file: {}", e)))?;
        return Ok(UploadedFile { name, content_type, bytes });
    }
    Err(ApiError::bad_request("No file uploaded"))
}

/// Rejects blank required string fields, naming each one.
pub fn require_fields(fields: &[(&'static str, &str)]) -> Result<(), ApiError> {
    let missing: std::collections::HashMap<String, String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| (name.to_string(), "This field is required".to_string()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Missing required fields", Some(missing)))
    }
}
