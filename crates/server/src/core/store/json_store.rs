//! JSON-based post storage
//!
//! Each post is one JSON document on disk, written atomically
//! (temp file + rename) and cached in memory behind a per-post lock.

use crate::core::models::{Comment, Like, Post};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// JSON-based post store
pub struct JsonPostStore {
    posts_dir: PathBuf,
    /// In-memory cache of every loaded post
    posts: RwLock<HashMap<String, Arc<RwLock<Post>>>>,
}

impl JsonPostStore {
    /// Open the store, loading every post document under `posts_dir`
    pub async fn new(posts_dir: impl Into<PathBuf>) -> Result<Self> {
        let posts_dir = posts_dir.into();
        fs::create_dir_all(&posts_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", posts_dir))?;

        let store = Self {
            posts_dir,
            posts: RwLock::new(HashMap::new()),
        };

        store.load_existing_posts().await?;

        info!(
            "JSON PostStore initialized with {} posts",
            store.posts.read().await.len()
        );

        Ok(store)
    }

    fn post_path(&self, post_id: &str) -> PathBuf {
        self.posts_dir.join(format!("{}.json", post_id))
    }

    async fn load_existing_posts(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.posts_dir).await?;
        let mut posts = self.posts.write().await;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match load_post_from_disk(&path).await {
                Ok(post) => {
                    posts.insert(post.id.clone(), Arc::new(RwLock::new(post)));
                }
                Err(e) => {
                    warn!("Failed to load post from {:?}: {:#}", path, e);
                }
            }
        }

        Ok(())
    }

    async fn save_post_to_disk(&self, post: &Post) -> Result<()> {
        let path = self.post_path(&post.id);
        let temp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(post)?;
        fs::write(&temp_path, json)
            .await
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {:?}", path))?;

        Ok(())
    }

    /// Persist a new post
    pub async fn insert(&self, post: Post) -> Result<Post> {
        self.save_post_to_disk(&post).await?;
        self.posts
            .write()
            .await
            .insert(post.id.clone(), Arc::new(RwLock::new(post.clone())));

        info!("Created post {} by {}", post.id, post.username);
        Ok(post)
    }

    /// Every post, newest first
    pub async fn list(&self) -> Vec<Post> {
        let handles: Vec<Arc<RwLock<Post>>> = self.posts.read().await.values().cloned().collect();

        let mut posts = Vec::with_capacity(handles.len());
        for handle in handles {
            posts.push(handle.read().await.clone());
        }

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    pub async fn get(&self, post_id: &str) -> Option<Post> {
        let handle = self.posts.read().await.get(post_id).cloned()?;
        let post = handle.read().await.clone();
        Some(post)
    }

    /// Toggle `user_id`'s like; `None` if the post does not exist
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<Option<Vec<Like>>> {
        self.update(post_id, |post| {
            post.toggle_like(user_id);
            post.likes.clone()
        })
        .await
    }

    /// Prepend a comment; `None` if the post does not exist
    pub async fn add_comment(
        &self,
        post_id: &str,
        comment: Comment,
    ) -> Result<Option<Vec<Comment>>> {
        self.update(post_id, |post| {
            post.add_comment(comment);
            post.comments.clone()
        })
        .await
    }

    /// Read-modify-write a single post under its lock. The in-memory copy is
    /// only replaced once the document has been written.
    async fn update<T>(
        &self,
        post_id: &str,
        apply: impl FnOnce(&mut Post) -> T,
    ) -> Result<Option<T>> {
        let Some(handle) = self.posts.read().await.get(post_id).cloned() else {
            return Ok(None);
        };

        let mut guard = handle.write().await;
        let mut updated = guard.clone();
        let out = apply(&mut updated);

        self.save_post_to_disk(&updated).await?;
        *guard = updated;

        Ok(Some(out))
    }
}

async fn load_post_from_disk(path: &Path) -> Result<Post> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse post {:?}", path))
}
