use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::post::Post;

/// Fixed feed page size.
pub const POSTS_PER_PAGE: i64 = 2;

pub fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1) * POSTS_PER_PAGE
}

fn post_from_row(row: &Row) -> Result<Post, tokio_postgres::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        image_url: row.try_get("image_url")?,
        creator: row.try_get("creator")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PostRepository;

impl PostRepository {
    /// One page of posts, most recent first, plus the total row count.
    pub async fn page(pool: &Pool, page: i64) -> Result<(Vec<Post>, i64), ApiError> {
        let client = pool.get().await?;

        let total: i64 = client
            .query_one("SELECT COUNT(*) FROM posts", &[])
            .await?
            .try_get(0)?;

        let rows = client
            .query(
                "SELECT id, title, content, image_url, creator, created_at, updated_at \
                 FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                &[&POSTS_PER_PAGE, &page_offset(page)],
            )
            .await?;

        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    pub async fn find(pool: &Pool, post_id: Uuid) -> Result<Option<Post>, ApiError> {
        let client = pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, title, content, image_url, creator, created_at, updated_at \
                 FROM posts WHERE id = $1",
                &[&post_id],
            )
            .await?;

        row.as_ref().map(post_from_row).transpose().map_err(Into::into)
    }

    pub async fn insert(pool: &Pool, post: &Post) -> Result<(), ApiError> {
        let client = pool.get().await?;
        client
            .execute(
                "INSERT INTO posts (id, title, content, image_url, creator, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &post.id,
                    &post.title,
                    &post.content,
                    &post.image_url,
                    &post.creator,
                    &post.created_at,
                    &post.updated_at,
                ],
            )
            .await?;
        Ok(())
    }

    /// Rewrites the mutable columns; `creator` and `created_at` are never
    /// touched after creation.
    pub async fn update(pool: &Pool, post: &Post) -> Result<(), ApiError> {
        let client = pool.get().await?;
        client
            .execute(
                "UPDATE posts SET title = $1, content = $2, image_url = $3, updated_at = $4 \
                 WHERE id = $5",
                &[
                    &post.title,
                    &post.content,
                    &post.image_url,
                    &post.updated_at,
                    &post.id,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete(pool: &Pool, post_id: Uuid) -> Result<(), ApiError> {
        let client = pool.get().await?;
        client
            .execute("DELETE FROM posts WHERE id = $1", &[&post_id])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_the_fixed_page_size() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 2);
        assert_eq!(page_offset(6), 10);
    }

    #[test]
    fn nonpositive_pages_clamp_to_the_first_page() {
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(-3), 0);
    }
}
