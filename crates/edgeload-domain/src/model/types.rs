//! Records of the blog/media graph.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};

/// A registered user. Authors posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub name: String,
    /// Password hash supplied by the caller; never a plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> EntityId {
        self.id
    }
}

/// A blog post written by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub author_id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const KIND: &'static str = "post";

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Discriminator for the concrete media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "IMAGE"),
            MediaKind::Video => write!(f, "VIDEO"),
        }
    }
}

/// An uploaded file, optionally attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: EntityId,
    pub filename: String,
    pub mimetype: Option<String>,
    pub url: String,
    pub kind: MediaKind,
    pub post_id: Option<EntityId>,
}

impl Entity for Media {
    const KIND: &'static str = "media";

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Image-specific attributes. Shares its id with the owning media row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub id: EntityId,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl Entity for ImageDetails {
    const KIND: &'static str = "image";

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Video-specific attributes. Shares its id with the owning media row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: EntityId,
    pub duration: Option<i32>,
    pub resolution: Option<String>,
}

impl Entity for VideoDetails {
    const KIND: &'static str = "video";

    fn id(&self) -> EntityId {
        self.id
    }
}

/// An API client allowed to call mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret_hash: String,
}

/// Pre-validated caller identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pub id: EntityId,
    pub client_id: String,
}

impl From<&Client> for ClientIdentity {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            client_id: client.client_id.clone(),
        }
    }
}
