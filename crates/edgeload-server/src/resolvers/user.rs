//! User queries, fields and mutations.

use std::sync::Arc;

use tracing::instrument;

use edgeload_domain::error::DomainResult;
use edgeload_domain::model::{EntityId, Post, User, USER_POSTS};
use edgeload_storage::{DataStore, NewUser};

use super::Resolver;
use crate::adapters::IntoDomainResult;

impl<'a, S: DataStore + ?Sized> Resolver<'a, S> {
    /// `Query.users`
    pub async fn users(&self) -> DomainResult<Vec<Arc<User>>> {
        let users = self.store.list_users().await.into_domain()?;
        Ok(self.remember(users))
    }

    /// `Query.user(id)`
    pub async fn user(&self, id: EntityId) -> DomainResult<Option<Arc<User>>> {
        if let Some(cached) = self.ctx.cache().get::<User>(id) {
            return Ok(Some(cached));
        }
        let users = self.store.users_by_ids(&[id]).await.into_domain()?;
        Ok(self.remember(users).pop())
    }

    /// `User.posts`
    pub async fn user_posts(&self, user: &User) -> DomainResult<Vec<Arc<Post>>> {
        let store = self.store;
        self.loader()
            .has_many(user, &USER_POSTS, move |author_ids| async move {
                store.posts_by_author_ids(&author_ids).await.into_domain()
            })
            .await
    }

    /// `Mutation.createUser`
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> DomainResult<Arc<User>> {
        self.ctx.require_identity()?;
        let user = self.store.create_user(input).await.into_domain()?;
        Ok(self.remember_one(user))
    }
}
