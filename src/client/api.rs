use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::dtos::auth_dtos::{LoginOut, SignupOut};
use crate::dtos::post_dtos::{FeedPageOut, MessageOut, PostDetailOut, PostMutationOut};

/// Client-side failures collapse to a displayable message; the client does
/// not distinguish error kinds beyond the text.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Thin wrapper over the HTTP API, one awaitable method per endpoint.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SignupOut, ClientError> {
        let resp = self
            .http
            .post(format!("{}/auth/signup", self.base_url))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOut, ClientError> {
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn fetch_posts(&self, page: i64) -> Result<FeedPageOut, ClientError> {
        let resp = self
            .http
            .get(format!("{}/feed/posts", self.base_url))
            .query(&[("page", page)])
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn fetch_post(&self, post_id: Uuid) -> Result<PostDetailOut, ClientError> {
        let resp = self
            .http
            .get(format!("{}/feed/posts/{}", self.base_url, post_id))
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn create_post(
        &self,
        token: &str,
        title: &str,
        content: &str,
        image: Option<&Path>,
    ) -> Result<PostMutationOut, ClientError> {
        let form = post_form(title, content, image).await?;
        let resp = self
            .http
            .post(format!("{}/feed/posts", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn update_post(
        &self,
        token: &str,
        post_id: Uuid,
        title: &str,
        content: &str,
        image: Option<&Path>,
    ) -> Result<PostMutationOut, ClientError> {
        let form = post_form(title, content, image).await?;
        let resp = self
            .http
            .put(format!("{}/feed/posts/{}", self.base_url, post_id))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }

    pub async fn delete_post(&self, token: &str, post_id: Uuid) -> Result<MessageOut, ClientError> {
        let resp = self
            .http
            .delete(format!("{}/feed/posts/{}", self.base_url, post_id))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(checked(resp).await?.json().await?)
    }
}

/// Any non-2xx response becomes a `ClientError::Server` carrying the
/// server's `message` when one is present.
async fn checked(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }

    let status = resp.status();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {}.", status));
    Err(ClientError::Server(message))
}

async fn post_form(title: &str, content: &str, image: Option<&Path>) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("content", content.to_string());

    if let Some(path) = image {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str(mime_for(&filename))?;
        form = form.part("image", part);
    }

    Ok(form)
}

fn mime_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_guess_follows_the_extension() {
        assert_eq!(mime_for("a.png"), "image/png");
        assert_eq!(mime_for("a.JPG"), "image/jpeg");
        assert_eq!(mime_for("a.jpg"), "image/jpeg");
        assert_eq!(mime_for("a.webp"), "image/webp");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3005/");
        assert_eq!(client.base_url, "http://localhost:3005");
    }
}
