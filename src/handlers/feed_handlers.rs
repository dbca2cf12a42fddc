use std::fs;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::dtos::post_dtos::{FeedPageOut, MessageOut, PageQuery, PostDetailOut, PostMutationOut};
use crate::error::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::post::Post;
use crate::repositories::post_repository::PostRepository;
use crate::uploads;
use crate::validation;
use crate::AppState;

/// Mutations are restricted to the post's creator.
fn ensure_owner(post: &Post, user_id: Uuid, action: &str) -> Result<(), ApiError> {
    if post.creator != user_id {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this post.",
            action
        )));
    }
    Ok(())
}

/// GET /feed/posts?page=N
#[get("/posts")]
pub async fn get_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page.unwrap_or(1);
    let (posts, total_items) = PostRepository::page(&state.pool, page).await?;

    Ok(HttpResponse::Ok().json(FeedPageOut {
        posts: posts.into_iter().map(Into::into).collect(),
        total_items,
    }))
}

/// GET /feed/posts/{postId}
#[get("/posts/{post_id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post = PostRepository::find(&state.pool, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find post.".to_string()))?;

    Ok(HttpResponse::Ok().json(PostDetailOut { post: post.into() }))
}

/// POST /feed/posts (multipart, auth required)
#[post("/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = uploads::read_post_form(&mut payload).await?;
    validation::validate_post_input(&form.title, &form.content)?;

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        title: form.title.trim().to_string(),
        content: form.content.trim().to_string(),
        image_url: form.image_url,
        creator: user.user_id,
        created_at: now,
        updated_at: now,
    };
    PostRepository::insert(&state.pool, &post).await?;

    info!("post {} created by {}", post.id, user.user_id);
    Ok(HttpResponse::Created().json(PostMutationOut {
        message: "Post created successfully.".to_string(),
        post: post.into(),
    }))
}

/// PUT /feed/posts/{postId} (multipart, auth required)
///
/// Without a new file the existing image is kept; with one, the replaced
/// file is removed from disk after the row is rewritten.
#[put("/posts/{post_id}")]
pub async fn update_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let form = uploads::read_post_form(&mut payload).await?;
    validation::validate_post_input(&form.title, &form.content)?;

    let mut post = PostRepository::find(&state.pool, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find post.".to_string()))?;
    ensure_owner(&post, user.user_id, "edit")?;

    let mut replaced_image = None;
    if let Some(new_image) = form.image_url {
        if post.image_url.as_deref() != Some(new_image.as_str()) {
            replaced_image = post.image_url.take();
        }
        post.image_url = Some(new_image);
    }

    post.title = form.title.trim().to_string();
    post.content = form.content.trim().to_string();
    post.updated_at = Utc::now();
    PostRepository::update(&state.pool, &post).await?;

    if let Some(old) = replaced_image {
        uploads::remove_image(&old);
    }

    info!("post {} updated by {}", post.id, user.user_id);
    Ok(HttpResponse::Ok().json(PostMutationOut {
        message: "Post updated.".to_string(),
        post: post.into(),
    }))
}

/// DELETE /feed/posts/{postId} (auth required)
#[delete("/posts/{post_id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();

    let post = PostRepository::find(&state.pool, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not find post.".to_string()))?;
    ensure_owner(&post, user.user_id, "delete")?;

    PostRepository::delete(&state.pool, post_id).await?;
    if let Some(image) = post.image_url {
        uploads::remove_image(&image);
    }

    info!("post {} deleted by {}", post_id, user.user_id);
    Ok(HttpResponse::Ok().json(MessageOut {
        message: "Deleted post.".to_string(),
    }))
}

/// GET /images/{filename} - serves stored uploads back to the clients.
#[get("/images/{filename}")]
pub async fn serve_image(path: web::Path<String>) -> HttpResponse {
    let filename = path.into_inner();

    // keep reads inside the upload directory
    let safe_filename = match Path::new(&filename).file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return HttpResponse::NotFound().finish(),
    };

    let file_path = format!("{}/{}", uploads::UPLOAD_DIR, safe_filename);
    match fs::read(&file_path) {
        Ok(data) => HttpResponse::Ok()
            .content_type(uploads::content_type_for(safe_filename))
            .body(data),
        Err(_) => HttpResponse::NotFound().json(MessageOut {
            message: "Image not found.".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    fn post_owned_by(creator: Uuid) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: "a title".to_string(),
            content: "some content".to_string(),
            image_url: None,
            creator,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn the_creator_may_mutate_their_own_post() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner);
        assert!(ensure_owner(&post, owner, "edit").is_ok());
    }

    #[test]
    fn a_non_owner_gets_forbidden_for_edit_and_delete() {
        let post = post_owned_by(Uuid::new_v4());
        let stranger = Uuid::new_v4();

        for action in ["edit", "delete"] {
            let err = ensure_owner(&post, stranger, action).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
            assert!(matches!(err, ApiError::Forbidden(_)));
        }
    }
}
