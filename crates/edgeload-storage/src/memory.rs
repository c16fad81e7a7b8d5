//! In-memory storage implementation for testing and development.
//!
//! Every read operation increments a query counter, the in-memory analogue
//! of counting `SELECT` statements against a relational backend. Tests use
//! it to assert that a traversal issues a bounded number of queries
//! regardless of how many rows it touches.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{instrument, trace};

use edgeload_domain::model::{
    Client, EntityId, ImageDetails, Media, MediaKind, Post, User, VideoDetails,
};

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    require_non_empty, validate_media, DataStore, NewClient, NewImage, NewPost, NewUser,
    NewVideo, PostUpdate,
};

/// In-memory implementation of DataStore.
///
/// Uses DashMap for thread-safe concurrent access. Ids are allocated from
/// per-table atomic sequences starting at 1.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    users: DashMap<EntityId, User>,
    /// Unique index: email -> user id.
    user_emails: DashMap<String, EntityId>,
    posts: DashMap<EntityId, Post>,
    media: DashMap<EntityId, Media>,
    images: DashMap<EntityId, ImageDetails>,
    videos: DashMap<EntityId, VideoDetails>,
    clients: DashMap<EntityId, Client>,
    /// Unique index: client_id -> client row id.
    client_ids: DashMap<String, EntityId>,
    user_seq: AtomicI64,
    post_seq: AtomicI64,
    media_seq: AtomicI64,
    client_seq: AtomicI64,
    queries: AtomicU64,
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of read queries served since creation or the last reset.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    fn record_query(&self, query: &'static str) {
        self.queries.fetch_add(1, Ordering::SeqCst);
        trace!(query = query, "memory store query");
    }
}

fn next_id(seq: &AtomicI64) -> EntityId {
    seq.fetch_add(1, Ordering::SeqCst) + 1
}

/// Collects the values stored under `ids`, sorted by id.
fn collect_by_ids<V: Clone>(
    map: &DashMap<EntityId, V>,
    ids: &[EntityId],
) -> Vec<(EntityId, V)> {
    let unique: HashSet<EntityId> = ids.iter().copied().collect();
    let mut rows: Vec<(EntityId, V)> = unique
        .into_iter()
        .filter_map(|id| map.get(&id).map(|row| (id, row.value().clone())))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows
}

/// Collects every value matching `predicate`, sorted by id.
fn collect_where<V: Clone>(
    map: &DashMap<EntityId, V>,
    predicate: impl Fn(&V) -> bool,
) -> Vec<V> {
    let mut rows: Vec<(EntityId, V)> = map
        .iter()
        .filter(|row| predicate(row.value()))
        .map(|row| (*row.key(), row.value().clone()))
        .collect();
    rows.sort_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, v)| v).collect()
}

fn values<V>(rows: Vec<(EntityId, V)>) -> Vec<V> {
    rows.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl DataStore for MemoryDataStore {
    #[instrument(skip(self), fields(count = ids.len()))]
    async fn users_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("users_by_ids");
        Ok(values(collect_by_ids(&self.users, ids)))
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        self.record_query("list_users");
        Ok(collect_where(&self.users, |_| true))
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        require_non_empty("email", &user.email)?;
        require_non_empty("name", &user.name)?;

        // Use atomic entry API so two creates with one email cannot both win
        let id = match self.user_emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Duplicate {
                    kind: "user",
                    field: "email",
                    value: user.email,
                });
            }
            Entry::Vacant(entry) => {
                let id = next_id(&self.user_seq);
                entry.insert(id);
                id
            }
        };

        let created = User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
        };
        self.users.insert(id, created.clone());
        Ok(created)
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn posts_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("posts_by_ids");
        Ok(values(collect_by_ids(&self.posts, ids)))
    }

    #[instrument(skip(self), fields(count = author_ids.len()))]
    async fn posts_by_author_ids(&self, author_ids: &[EntityId]) -> StorageResult<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("posts_by_author_ids");
        let wanted: HashSet<EntityId> = author_ids.iter().copied().collect();
        Ok(collect_where(&self.posts, |post| {
            wanted.contains(&post.author_id)
        }))
    }

    async fn list_posts(&self) -> StorageResult<Vec<Post>> {
        self.record_query("list_posts");
        Ok(collect_where(&self.posts, |_| true))
    }

    #[instrument(skip(self, post), fields(author_id = post.author_id))]
    async fn create_post(&self, post: NewPost) -> StorageResult<Post> {
        require_non_empty("title", &post.title)?;
        if !self.users.contains_key(&post.author_id) {
            return Err(StorageError::ForeignKeyViolation {
                kind: "post",
                target: "user",
                id: post.author_id,
            });
        }

        let now = Utc::now();
        let created = Post {
            id: next_id(&self.post_seq),
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.insert(created.id, created.clone());
        Ok(created)
    }

    #[instrument(skip(self, update))]
    async fn update_post(&self, id: EntityId, update: PostUpdate) -> StorageResult<Post> {
        if let Some(title) = &update.title {
            require_non_empty("title", title)?;
        }

        // Capture timestamp before acquiring the shard lock
        let now = Utc::now();

        let mut entry = self
            .posts
            .get_mut(&id)
            .ok_or(StorageError::NotFound { kind: "post", id })?;

        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(content) = update.content {
            entry.content = content;
        }
        entry.updated_at = now;

        Ok(entry.clone())
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: EntityId) -> StorageResult<()> {
        if self.posts.remove(&id).is_none() {
            return Err(StorageError::NotFound { kind: "post", id });
        }
        for mut media in self.media.iter_mut() {
            if media.post_id == Some(id) {
                media.post_id = None;
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn media_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<Media>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("media_by_ids");
        Ok(values(collect_by_ids(&self.media, ids)))
    }

    #[instrument(skip(self), fields(count = post_ids.len()))]
    async fn media_by_post_ids(&self, post_ids: &[EntityId]) -> StorageResult<Vec<Media>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("media_by_post_ids");
        let wanted: HashSet<EntityId> = post_ids.iter().copied().collect();
        Ok(collect_where(&self.media, |media| {
            media.post_id.is_some_and(|id| wanted.contains(&id))
        }))
    }

    async fn list_media(&self) -> StorageResult<Vec<Media>> {
        self.record_query("list_media");
        Ok(collect_where(&self.media, |_| true))
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn images_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<ImageDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("images_by_ids");
        Ok(values(collect_by_ids(&self.images, ids)))
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn videos_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<VideoDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.record_query("videos_by_ids");
        Ok(values(collect_by_ids(&self.videos, ids)))
    }

    #[instrument(skip(self, image), fields(filename = %image.filename))]
    async fn create_image(&self, image: NewImage) -> StorageResult<(Media, ImageDetails)> {
        validate_media(&image.filename, &image.url)?;
        self.check_post_reference(image.post_id)?;

        let id = next_id(&self.media_seq);
        let media = Media {
            id,
            filename: image.filename,
            mimetype: image.mimetype,
            url: image.url,
            kind: MediaKind::Image,
            post_id: image.post_id,
        };
        let details = ImageDetails {
            id,
            width: image.width,
            height: image.height,
        };
        self.images.insert(id, details.clone());
        self.media.insert(id, media.clone());
        Ok((media, details))
    }

    #[instrument(skip(self, video), fields(filename = %video.filename))]
    async fn create_video(&self, video: NewVideo) -> StorageResult<(Media, VideoDetails)> {
        validate_media(&video.filename, &video.url)?;
        self.check_post_reference(video.post_id)?;

        let id = next_id(&self.media_seq);
        let media = Media {
            id,
            filename: video.filename,
            mimetype: video.mimetype,
            url: video.url,
            kind: MediaKind::Video,
            post_id: video.post_id,
        };
        let details = VideoDetails {
            id,
            duration: video.duration,
            resolution: video.resolution,
        };
        self.videos.insert(id, details.clone());
        self.media.insert(id, media.clone());
        Ok((media, details))
    }

    #[instrument(skip(self, client), fields(client_id = %client.client_id))]
    async fn create_client(&self, client: NewClient) -> StorageResult<Client> {
        require_non_empty("client_id", &client.client_id)?;

        let id = match self.client_ids.entry(client.client_id.clone()) {
            Entry::Occupied(_) => {
                return Err(StorageError::Duplicate {
                    kind: "client",
                    field: "client_id",
                    value: client.client_id,
                });
            }
            Entry::Vacant(entry) => {
                let id = next_id(&self.client_seq);
                entry.insert(id);
                id
            }
        };

        let created = Client {
            id,
            name: client.name,
            client_id: client.client_id,
            client_secret_hash: client.client_secret_hash,
        };
        self.clients.insert(id, created.clone());
        Ok(created)
    }

    async fn find_client_by_client_id(&self, client_id: &str) -> StorageResult<Option<Client>> {
        self.record_query("find_client_by_client_id");
        let Some(id) = self.client_ids.get(client_id).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.clients.get(&id).map(|row| row.value().clone()))
    }
}

impl MemoryDataStore {
    fn check_post_reference(&self, post_id: Option<EntityId>) -> StorageResult<()> {
        match post_id {
            Some(id) if !self.posts.contains_key(&id) => Err(StorageError::ForeignKeyViolation {
                kind: "media",
                target: "post",
                id,
            }),
            _ => Ok(()),
        }
    }
}
