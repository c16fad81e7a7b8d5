//! Query, field and mutation resolvers for the blog/media graph.
//!
//! A [`Resolver`] pairs a [`DataStore`] with the [`RequestContext`] of one
//! request. Root queries load rows straight from the store and merge them
//! into the request cache; field resolvers traverse edges through the
//! relation loader so sibling fields share one batched fetch. Mutations
//! require a caller identity and merge what they write into the cache.
//!
//! # Organization
//!
//! - `user.rs` - `users`, `user`, `User.posts`, `create_user`
//! - `post.rs` - `posts`, `post`, `Post.author`, `Post.media`, post mutations
//! - `media.rs` - `all_media`, `media`, `Media.post`, media details, media mutations

mod media;
mod post;
mod user;

pub use media::MediaDetails;

use std::sync::Arc;

use edgeload_domain::model::{Entity, EntityId};
use edgeload_domain::{RelationLoader, RequestContext};
use edgeload_storage::DataStore;

/// Resolvers bound to one store and one request.
pub struct Resolver<'a, S: DataStore + ?Sized> {
    store: &'a S,
    ctx: &'a RequestContext,
}

impl<'a, S: DataStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S, ctx: &'a RequestContext) -> Self {
        Self { store, ctx }
    }

    pub fn context(&self) -> &'a RequestContext {
        self.ctx
    }

    fn loader(&self) -> RelationLoader<'a> {
        self.ctx.loader()
    }

    /// Merges freshly loaded rows into the request cache and returns the
    /// cached snapshots in the order the rows were given.
    fn remember<E: Entity>(&self, rows: Vec<E>) -> Vec<Arc<E>> {
        let ids: Vec<EntityId> = rows.iter().map(Entity::id).collect();
        let cache = self.ctx.cache();
        cache.merge(rows);
        ids.into_iter().filter_map(|id| cache.get::<E>(id)).collect()
    }

    /// Merges one written row and returns its cached snapshot.
    fn remember_one<E: Entity>(&self, row: E) -> Arc<E> {
        let id = row.id();
        let cache = self.ctx.cache();
        cache.merge([row.clone()]);
        cache.get::<E>(id).unwrap_or_else(|| Arc::new(row))
    }
}
