//! REST calls against the feed API

use crate::error::{ClientError, Result};
use crate::models::{AuthUser, Comment, Like, Post};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthUser> {
        let req = self.http.post(self.url("/api/users/register")).json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }));
        send_json(req).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser> {
        let req = self
            .http
            .post(self.url("/api/users/login"))
            .json(&json!({ "email": email, "password": password }));
        send_json(req).await
    }

    /// Whole feed, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        send_json(self.http.get(self.url("/api/posts"))).await
    }

    pub async fn create_post(
        &self,
        user: Option<&AuthUser>,
        text: Option<&str>,
        image: Option<&str>,
    ) -> Result<Post> {
        let user = user.ok_or(ClientError::NotAuthenticated)?;
        let req = self
            .http
            .post(self.url("/api/posts"))
            .bearer_auth(&user.token)
            .json(&json!({ "text": text, "image": image }));
        send_json(req).await
    }

    /// Like or unlike; returns the post's updated likes
    pub async fn toggle_like(&self, user: Option<&AuthUser>, post_id: &str) -> Result<Vec<Like>> {
        let user = user.ok_or(ClientError::NotAuthenticated)?;
        let req = self
            .http
            .put(self.url(&format!("/api/posts/{}/like", post_id)))
            .bearer_auth(&user.token);
        send_json(req).await
    }

    /// Returns the post's updated comments, newest first
    pub async fn add_comment(
        &self,
        user: Option<&AuthUser>,
        post_id: &str,
        text: &str,
    ) -> Result<Vec<Comment>> {
        let user = user.ok_or(ClientError::NotAuthenticated)?;
        let req = self
            .http
            .post(self.url(&format!("/api/posts/{}/comment", post_id)))
            .bearer_auth(&user.token)
            .json(&json!({ "text": text }));
        send_json(req).await
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    debug!("{} {}", resp.status(), resp.url());
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

/// Pull the `message` field out of an error body
async fn api_error(resp: Response) -> ClientError {
    let status = resp.status();
    let message = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string(),
        Err(_) => String::new(),
    };
    warn!("API request failed with {}: {}", status, message);
    ClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = FeedClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.url("/api/posts"), "http://localhost:5001/api/posts");
    }

    #[tokio::test]
    async fn test_protected_calls_fail_locally_without_user() {
        let client = FeedClient::new("http://127.0.0.1:9");

        let err = client.toggle_like(None, "p1").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));

        let err = client.add_comment(None, "p1", "hi").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));

        let err = client.create_post(None, Some("hi"), None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
