//! DataStore trait definition.

use async_trait::async_trait;
use edgeload_domain::model::{
    Client, EntityId, ImageDetails, Media, Post, User, VideoDetails,
};

use crate::error::{StorageError, StorageResult};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    /// Already-hashed password.
    pub password_hash: String,
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: EntityId,
}

/// Partial post update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Input for creating an image media row with its details.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub mimetype: Option<String>,
    pub url: String,
    pub post_id: Option<EntityId>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Input for creating a video media row with its details.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub filename: String,
    pub mimetype: Option<String>,
    pub url: String,
    pub post_id: Option<EntityId>,
    pub duration: Option<i32>,
    pub resolution: Option<String>,
}

/// Input for registering an API client.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub client_id: String,
    pub client_secret_hash: String,
}

/// Abstract storage interface for the blog/media graph.
///
/// Batch lookups take a slice of ids and return only the rows that exist,
/// in no particular order. An empty slice yields an empty result without
/// touching the backend.
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // User operations

    /// Returns the users whose id is in `ids`.
    async fn users_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<User>>;

    /// Lists all users ordered by id.
    async fn list_users(&self) -> StorageResult<Vec<User>>;

    /// Creates a user. Emails are unique.
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    // Post operations

    /// Returns the posts whose id is in `ids`.
    async fn posts_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<Post>>;

    /// Returns every post written by any of `author_ids`.
    async fn posts_by_author_ids(&self, author_ids: &[EntityId]) -> StorageResult<Vec<Post>>;

    /// Lists all posts ordered by id.
    async fn list_posts(&self) -> StorageResult<Vec<Post>>;

    /// Creates a post. The author must exist.
    async fn create_post(&self, post: NewPost) -> StorageResult<Post>;

    /// Applies `update` to post `id`.
    async fn update_post(&self, id: EntityId, update: PostUpdate) -> StorageResult<Post>;

    /// Deletes post `id`. Media attached to it are detached.
    async fn delete_post(&self, id: EntityId) -> StorageResult<()>;

    // Media operations

    /// Returns the media rows whose id is in `ids`.
    async fn media_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<Media>>;

    /// Returns every media row attached to any of `post_ids`.
    async fn media_by_post_ids(&self, post_ids: &[EntityId]) -> StorageResult<Vec<Media>>;

    /// Lists all media ordered by id.
    async fn list_media(&self) -> StorageResult<Vec<Media>>;

    /// Returns image details for the given media ids.
    async fn images_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<ImageDetails>>;

    /// Returns video details for the given media ids.
    async fn videos_by_ids(&self, ids: &[EntityId]) -> StorageResult<Vec<VideoDetails>>;

    /// Creates an image media row and its details in one step.
    async fn create_image(&self, image: NewImage) -> StorageResult<(Media, ImageDetails)>;

    /// Creates a video media row and its details in one step.
    async fn create_video(&self, video: NewVideo) -> StorageResult<(Media, VideoDetails)>;

    // Client operations

    /// Registers an API client. Client ids are unique.
    async fn create_client(&self, client: NewClient) -> StorageResult<Client>;

    /// Finds a client by its public client id.
    async fn find_client_by_client_id(&self, client_id: &str) -> StorageResult<Option<Client>>;
}

/// Rejects blank required text columns.
pub(crate) fn require_non_empty(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: format!("{} cannot be empty", field),
        });
    }
    Ok(())
}

/// Validates the common columns of a new media row.
pub(crate) fn validate_media(filename: &str, url: &str) -> StorageResult<()> {
    require_non_empty("filename", filename)?;
    require_non_empty("url", url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty_rejects_blank() {
        assert!(require_non_empty("title", "Hello").is_ok());
        let err = require_non_empty("title", "   ").unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput { message } if message == "title cannot be empty"));
    }

    #[test]
    fn test_validate_media_checks_both_columns() {
        assert!(validate_media("a.png", "/uploads/a.png").is_ok());
        assert!(validate_media("", "/uploads/a.png").is_err());
        assert!(validate_media("a.png", "").is_err());
    }
}
