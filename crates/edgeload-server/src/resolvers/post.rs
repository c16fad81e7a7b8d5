//! Post queries, fields and mutations.

use std::sync::Arc;

use tracing::{debug, instrument};

use edgeload_domain::error::DomainResult;
use edgeload_domain::model::{EntityId, Media, Post, User, POST_AUTHOR, POST_MEDIA};
use edgeload_storage::{DataStore, NewPost, PostUpdate};

use super::Resolver;
use crate::adapters::IntoDomainResult;

impl<'a, S: DataStore + ?Sized> Resolver<'a, S> {
    /// `Query.posts`
    pub async fn posts(&self) -> DomainResult<Vec<Arc<Post>>> {
        let posts = self.store.list_posts().await.into_domain()?;
        Ok(self.remember(posts))
    }

    /// `Query.post(id)`
    pub async fn post(&self, id: EntityId) -> DomainResult<Option<Arc<Post>>> {
        if let Some(cached) = self.ctx.cache().get::<Post>(id) {
            return Ok(Some(cached));
        }
        let posts = self.store.posts_by_ids(&[id]).await.into_domain()?;
        Ok(self.remember(posts).pop())
    }

    /// `Post.author`
    pub async fn post_author(&self, post: &Post) -> DomainResult<Option<Arc<User>>> {
        let store = self.store;
        self.loader()
            .belongs_to(post, &POST_AUTHOR, move |ids| async move {
                store.users_by_ids(&ids).await.into_domain()
            })
            .await
    }

    /// `Post.media`
    pub async fn post_media(&self, post: &Post) -> DomainResult<Vec<Arc<Media>>> {
        let store = self.store;
        self.loader()
            .has_many(post, &POST_MEDIA, move |post_ids| async move {
                store.media_by_post_ids(&post_ids).await.into_domain()
            })
            .await
    }

    /// `Mutation.createPost`
    #[instrument(skip(self, input), fields(author_id = input.author_id))]
    pub async fn create_post(&self, input: NewPost) -> DomainResult<Arc<Post>> {
        self.ctx.require_identity()?;
        let post = self.store.create_post(input).await.into_domain()?;
        Ok(self.remember_one(post))
    }

    /// `Mutation.updatePost`. Fails with `NotFound` for an unknown id.
    #[instrument(skip(self, update))]
    pub async fn update_post(&self, id: EntityId, update: PostUpdate) -> DomainResult<Arc<Post>> {
        self.ctx.require_identity()?;
        let post = self.store.update_post(id, update).await.into_domain()?;
        Ok(self.remember_one(post))
    }

    /// `Mutation.deletePost`. Fails with `NotFound` for an unknown id.
    ///
    /// A snapshot of the post already cached for this request stays
    /// readable until the request ends.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: EntityId) -> DomainResult<()> {
        self.ctx.require_identity()?;
        self.store.delete_post(id).await.into_domain()?;
        debug!(post_id = id, "post deleted");
        Ok(())
    }
}
