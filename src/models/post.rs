use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A `posts` row. `creator` is fixed at creation time; ownership is checked
/// against it before any mutation or deletion. `image_url` is a path under
/// the public `/images/` route and may be absent when the upload was
/// skipped or its MIME type was rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub creator: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
