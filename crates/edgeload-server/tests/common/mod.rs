//! Shared test utilities for edgeload server tests.

// Used across several test files; each is compiled as its own crate.
#![allow(dead_code)]

use std::sync::Arc;

use edgeload_domain::model::{ClientIdentity, MediaKind};
use edgeload_server::{RequestFactory, ServerConfig};
use edgeload_storage::{DataStore, MemoryDataStore, NewImage, NewPost, NewUser, NewVideo};

// =============================================================================
// Test Constants
// =============================================================================

/// Users in the seeded graph.
pub const USER_COUNT: usize = 5;

/// Posts written by each user.
pub const POSTS_PER_USER: usize = 3;

/// Media attached to each post, alternating image and video.
pub const MEDIA_PER_POST: usize = 4;

/// A factory over a memory store plus the seeded demo client's identity.
pub struct Fixture {
    pub store: Arc<MemoryDataStore>,
    pub factory: RequestFactory<MemoryDataStore>,
    pub identity: ClientIdentity,
}

impl Fixture {
    /// Factory with the default configuration and an empty graph.
    pub async fn empty() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        let store = MemoryDataStore::new_shared();
        let factory = RequestFactory::bootstrap(Arc::clone(&store), &config)
            .await
            .unwrap();
        let identity = factory
            .identify(&config.seed.client_id)
            .await
            .unwrap()
            .expect("demo client should be seeded in development");
        store.reset_query_count();
        Self {
            store,
            factory,
            identity,
        }
    }

    /// Factory over the standard seeded graph.
    pub async fn seeded() -> Self {
        let fixture = Self::empty().await;
        seed_graph(fixture.store.as_ref()).await;
        fixture.store.reset_query_count();
        fixture
    }
}

/// Seeds `USER_COUNT` users, each with `POSTS_PER_USER` posts, each with
/// `MEDIA_PER_POST` media items.
pub async fn seed_graph<S: DataStore + ?Sized>(store: &S) {
    for i in 0..USER_COUNT {
        let user = store
            .create_user(NewUser {
                email: format!("user{}@example.com", i),
                name: format!("User {}", i),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        for j in 0..POSTS_PER_USER {
            let post = store
                .create_post(NewPost {
                    title: format!("Post {}-{}", i, j),
                    content: format!("Content {}-{}", i, j),
                    author_id: user.id,
                })
                .await
                .unwrap();
            for k in 0..MEDIA_PER_POST {
                let filename = format!("Post {}-{}-media{}", i, j, k);
                if media_kind(k) == MediaKind::Image {
                    store
                        .create_image(NewImage {
                            url: format!("http://example.com/media/{}-{}-{}.png", i, j, k),
                            filename,
                            mimetype: Some("image/png".to_string()),
                            post_id: Some(post.id),
                            width: Some(800),
                            height: Some(600),
                        })
                        .await
                        .unwrap();
                } else {
                    store
                        .create_video(NewVideo {
                            url: format!("http://example.com/media/{}-{}-{}.mp4", i, j, k),
                            filename,
                            mimetype: Some("video/mp4".to_string()),
                            post_id: Some(post.id),
                            duration: Some(120),
                            resolution: Some("1080p".to_string()),
                        })
                        .await
                        .unwrap();
                }
            }
        }
    }
}

/// Kind of the `k`-th media item of a post.
pub fn media_kind(k: usize) -> MediaKind {
    if k % 2 == 0 {
        MediaKind::Image
    } else {
        MediaKind::Video
    }
}
