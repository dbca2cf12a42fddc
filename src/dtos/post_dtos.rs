use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::post::Post;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOut {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub creator: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostOut {
    fn from(post: Post) -> Self {
        PostOut {
            id: post.id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            creator: post.creator,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// One page of the feed, most recent first.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageOut {
    pub posts: Vec<PostOut>,
    pub total_items: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostDetailOut {
    pub post: PostOut,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostMutationOut {
    pub message: String,
    pub post: PostOut,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageOut {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}
