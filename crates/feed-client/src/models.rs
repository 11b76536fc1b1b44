use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated identity as returned by register/login and cached locally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub username: String,
    pub text: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        is_liked_by(&self.likes, user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub user: String,
    pub username: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

/// Whether `user_id` appears in a likes list
pub fn is_liked_by(likes: &[Like], user_id: &str) -> bool {
    likes.iter().any(|like| like.user == user_id)
}
