//! Mock store for loader testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{DomainError, DomainResult};
use crate::model::{EntityId, Media, MediaKind, Post, User};

/// One recorded fetch: which query ran and with which ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub query: &'static str,
    pub ids: Vec<EntityId>,
}

/// In-memory store that records every batch query it serves.
pub struct MockStore {
    users: RwLock<HashMap<EntityId, User>>,
    posts: RwLock<HashMap<EntityId, Post>>,
    media: RwLock<HashMap<EntityId, Media>>,
    calls: Mutex<Vec<FetchCall>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            posts: RwLock::new(HashMap::new()),
            media: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::from_millis(5)),
        }
    }

    pub async fn add_user(&self, id: EntityId, name: &str) -> User {
        let user = user(id, name);
        self.users.write().await.insert(id, user.clone());
        user
    }

    pub async fn add_post(&self, id: EntityId, author_id: EntityId) -> Post {
        let post = post(id, author_id);
        self.posts.write().await.insert(id, post.clone());
        post
    }

    pub async fn add_media(&self, id: EntityId, post_id: Option<EntityId>) -> Media {
        let media = Media {
            id,
            filename: format!("file-{}.png", id),
            mimetype: Some("image/png".to_string()),
            url: format!("/uploads/file-{}.png", id),
            kind: MediaKind::Image,
            post_id,
        };
        self.media.write().await.insert(id, media.clone());
        media
    }

    /// Makes every subsequent fetch fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, query: &str) -> Vec<FetchCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.query == query)
            .collect()
    }

    async fn begin(&self, query: &'static str, ids: &[EntityId]) -> DomainResult<()> {
        self.calls.lock().unwrap().push(FetchCall {
            query,
            ids: ids.to_vec(),
        });
        let delay = *self.delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::Storage {
                message: format!("{} failed", query),
            });
        }
        Ok(())
    }

    pub async fn users_by_ids(&self, ids: Vec<EntityId>) -> DomainResult<Vec<User>> {
        self.begin("users_by_ids", &ids).await?;
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    pub async fn posts_by_ids(&self, ids: Vec<EntityId>) -> DomainResult<Vec<Post>> {
        self.begin("posts_by_ids", &ids).await?;
        let posts = self.posts.read().await;
        Ok(ids.iter().filter_map(|id| posts.get(id).cloned()).collect())
    }

    pub async fn posts_by_author_ids(&self, ids: Vec<EntityId>) -> DomainResult<Vec<Post>> {
        self.begin("posts_by_author_ids", &ids).await?;
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .filter(|p| ids.contains(&p.author_id))
            .cloned()
            .collect())
    }

    pub async fn media_by_post_ids(&self, ids: Vec<EntityId>) -> DomainResult<Vec<Media>> {
        self.begin("media_by_post_ids", &ids).await?;
        let media = self.media.read().await;
        Ok(media
            .values()
            .filter(|m| m.post_id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }
}

pub fn user(id: EntityId, name: &str) -> User {
    User {
        id,
        email: format!("{}@example.com", name.to_lowercase()),
        name: name.to_string(),
        password_hash: "hash".to_string(),
    }
}

pub fn post(id: EntityId, author_id: EntityId) -> Post {
    let now = Utc::now();
    Post {
        id,
        title: format!("Post {}", id),
        content: format!("Content {}", id),
        author_id,
        created_at: now,
        updated_at: now,
    }
}
