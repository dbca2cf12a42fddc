use std::fs;
use std::path::Path;

use actix_multipart::{Field, Multipart};
use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use log::warn;
use mime::Mime;

use crate::error::ApiError;

/// Directory uploaded images are written to; also the public route prefix.
pub const UPLOAD_DIR: &str = "images";

/// File field name, everything else in the form is treated as text.
pub const IMAGE_FIELD: &str = "image";

const ALLOWED_MIME_TYPES: [&str; 4] = ["image/png", "image/jpg", "image/jpeg", "image/webp"];

/// The decoded `POST`/`PUT /feed/posts` form. `image_url` is present only
/// when an accepted image was part of the request.
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

pub fn is_allowed_mime(mime: &Mime) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime.essence_str())
}

/// Collision-resistant name: sortable timestamp, then the (sanitized)
/// original filename. Mirrors the storage layout the clients already
/// link against, so keep the shape stable.
pub fn unique_filename(original: &str) -> String {
    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");

    // strip any path components a hostile client sent along
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    format!("{}-{}", stamp, base)
}

/// Reads the multipart body of a post create/update request.
///
/// Text fields `title` and `content` are collected as UTF-8. At most one
/// file is taken from the `image` field; a file with a MIME type outside
/// the allow-list is drained and dropped so the request itself still
/// succeeds (long-standing contract with the clients, not an oversight).
pub async fn read_post_form(payload: &mut Multipart) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::Multipart(e.to_string()))?;
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or("")
            .to_string();

        match name.as_str() {
            "title" => form.title = read_text_field(&mut field).await?,
            "content" => form.content = read_text_field(&mut field).await?,
            IMAGE_FIELD => {
                // one file per request; extra parts are drained, never stored
                if form.image_url.is_some() {
                    warn!("dropping extra file under the {} field", IMAGE_FIELD);
                    drain_field(&mut field).await?;
                } else if let Some(path) = save_image_field(&mut field).await? {
                    form.image_url = Some(path);
                }
            }
            _ => drain_field(&mut field).await?,
        }
    }

    Ok(form)
}

async fn read_text_field(field: &mut Field) -> Result<String, ApiError> {
    let bytes = collect_field(field).await?;
    String::from_utf8(bytes).map_err(|_| ApiError::Multipart("field is not valid UTF-8".into()))
}

/// Persists the image field if its MIME type is allowed, returning the
/// public reference path. Disallowed types are logged and skipped.
async fn save_image_field(field: &mut Field) -> Result<Option<String>, ApiError> {
    let allowed = field.content_type().is_some_and(is_allowed_mime);
    if !allowed {
        warn!(
            "dropping upload with disallowed MIME type {:?}",
            field.content_type().map(Mime::essence_str)
        );
        drain_field(field).await?;
        return Ok(None);
    }

    let original = field
        .content_disposition()
        .get_filename()
        .unwrap_or("upload")
        .to_string();
    let filename = unique_filename(&original);

    let bytes = collect_field(field).await?;

    fs::create_dir_all(UPLOAD_DIR)
        .map_err(|e| ApiError::Internal(format!("failed to prepare upload dir: {}", e)))?;
    let disk_path = format!("{}/{}", UPLOAD_DIR, filename);
    fs::write(&disk_path, &bytes)
        .map_err(|e| ApiError::Internal(format!("failed to store upload: {}", e)))?;

    Ok(Some(disk_path))
}

async fn collect_field(field: &mut Field) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| ApiError::Multipart(e.to_string()))?;
        buf.extend_from_slice(&data);
    }
    Ok(buf)
}

async fn drain_field(field: &mut Field) -> Result<(), ApiError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| ApiError::Multipart(e.to_string()))?;
    }
    Ok(())
}

/// Best-effort unlink of a stored image. Only paths inside the upload
/// directory are touched; failures are logged, never surfaced, matching
/// the non-transactional file/row contract.
pub fn remove_image(image_url: &str) {
    let filename = match Path::new(image_url).file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return,
    };
    let path = format!("{}/{}", UPLOAD_DIR, filename);
    if let Err(e) = fs::remove_file(&path) {
        warn!("failed to remove image {}: {}", path, e);
    }
}

/// Content type for serving a stored image back, from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
