use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// A feed post with embedded likes and comments
///
/// Serialized with document-store field names (`_id`, camelCase timestamps)
/// so existing clients can read it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user id
    pub user: String,
    /// Snapshot of the owner's username at creation time
    pub username: String,
    pub text: Option<String>,
    pub image: Option<String>,
    /// Newest like first, at most one entry per user
    #[serde(default)]
    pub likes: Vec<Like>,
    /// Newest comment first
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Build a post, or `None` when both text and image are empty
    pub fn new(
        user: impl Into<String>,
        username: impl Into<String>,
        text: Option<String>,
        image: Option<String>,
    ) -> Option<Self> {
        let text = non_empty(text);
        let image = non_empty(image);
        if text.is_none() && image.is_none() {
            return None;
        }

        let now = Utc::now();
        Some(Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
            username: username.into(),
            text,
            image,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.user == user_id)
    }

    /// Unlike if `user_id` already liked the post, otherwise like at the front
    pub fn toggle_like(&mut self, user_id: &str) {
        if self.is_liked_by(user_id) {
            self.likes.retain(|like| like.user != user_id);
        } else {
            self.likes.insert(0, Like::new(user_id));
        }
        self.updated_at = Utc::now();
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
}

impl Like {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub username: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        user: impl Into<String>,
        username: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
            username: username.into(),
            text: text.into(),
            date: Utc::now(),
        }
    }
}

// Request bodies. Fields default to empty so a missing field reaches
// validation instead of failing JSON extraction.

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
