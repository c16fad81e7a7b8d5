//! Relation descriptors for every edge of the blog/media graph.

use super::entity::{Entity, EntityId};
use super::relation::{BelongsTo, HasMany};
use super::types::{ImageDetails, Media, MediaKind, Post, User, VideoDetails};

fn post_author_id(post: &Post) -> Option<EntityId> {
    Some(post.author_id)
}

fn media_post_id(media: &Media) -> Option<EntityId> {
    media.post_id
}

// Details rows share the media primary key; only media of the matching
// kind can have one.
fn media_image_id(media: &Media) -> Option<EntityId> {
    (media.kind == MediaKind::Image).then_some(media.id())
}

fn media_video_id(media: &Media) -> Option<EntityId> {
    (media.kind == MediaKind::Video).then_some(media.id())
}

/// `Post.author`: the user who wrote the post.
pub const POST_AUTHOR: BelongsTo<Post, User> = BelongsTo::new("author_id", post_author_id);

/// `User.posts`: every post authored by the user.
pub const USER_POSTS: HasMany<User, Post> = HasMany::new("author_id", post_author_id);

/// `Post.media`: media attached to the post.
pub const POST_MEDIA: HasMany<Post, Media> = HasMany::new("post_id", media_post_id);

/// `Media.post`: the post a media item is attached to, if any.
pub const MEDIA_POST: BelongsTo<Media, Post> = BelongsTo::new("post_id", media_post_id);

/// `Media.imageDetails`.
pub const MEDIA_IMAGE: BelongsTo<Media, ImageDetails> = BelongsTo::new("id", media_image_id);

/// `Media.videoDetails`.
pub const MEDIA_VIDEO: BelongsTo<Media, VideoDetails> = BelongsTo::new("id", media_video_id);
