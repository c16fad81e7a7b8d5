//! Media queries, fields and mutations.

use std::sync::Arc;

use tracing::instrument;

use edgeload_domain::error::DomainResult;
use edgeload_domain::model::{
    EntityId, ImageDetails, Media, MediaKind, Post, VideoDetails, MEDIA_IMAGE, MEDIA_POST,
    MEDIA_VIDEO,
};
use edgeload_storage::{DataStore, NewImage, NewVideo};

use super::Resolver;
use crate::adapters::IntoDomainResult;

/// Kind-specific attributes of a media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDetails {
    Image(Arc<ImageDetails>),
    Video(Arc<VideoDetails>),
}

impl<'a, S: DataStore + ?Sized> Resolver<'a, S> {
    /// `Query.allMedia`
    pub async fn all_media(&self) -> DomainResult<Vec<Arc<Media>>> {
        let media = self.store.list_media().await.into_domain()?;
        Ok(self.remember(media))
    }

    /// `Query.media(id)`
    pub async fn media(&self, id: EntityId) -> DomainResult<Option<Arc<Media>>> {
        if let Some(cached) = self.ctx.cache().get::<Media>(id) {
            return Ok(Some(cached));
        }
        let media = self.store.media_by_ids(&[id]).await.into_domain()?;
        Ok(self.remember(media).pop())
    }

    /// `Media.post`. `None` for media not attached to a post.
    pub async fn media_post(&self, media: &Media) -> DomainResult<Option<Arc<Post>>> {
        let store = self.store;
        self.loader()
            .belongs_to(media, &MEDIA_POST, move |ids| async move {
                store.posts_by_ids(&ids).await.into_domain()
            })
            .await
    }

    /// Image attributes. `None` for videos, without touching the store.
    pub async fn image_details(&self, media: &Media) -> DomainResult<Option<Arc<ImageDetails>>> {
        let store = self.store;
        self.loader()
            .belongs_to(media, &MEDIA_IMAGE, move |ids| async move {
                store.images_by_ids(&ids).await.into_domain()
            })
            .await
    }

    /// Video attributes. `None` for images, without touching the store.
    pub async fn video_details(&self, media: &Media) -> DomainResult<Option<Arc<VideoDetails>>> {
        let store = self.store;
        self.loader()
            .belongs_to(media, &MEDIA_VIDEO, move |ids| async move {
                store.videos_by_ids(&ids).await.into_domain()
            })
            .await
    }

    /// Kind-dispatched details: image attributes for images, video
    /// attributes for videos.
    pub async fn details(&self, media: &Media) -> DomainResult<Option<MediaDetails>> {
        Ok(match media.kind {
            MediaKind::Image => self.image_details(media).await?.map(MediaDetails::Image),
            MediaKind::Video => self.video_details(media).await?.map(MediaDetails::Video),
        })
    }

    /// `Mutation.createImage`
    #[instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn create_image(
        &self,
        input: NewImage,
    ) -> DomainResult<(Arc<Media>, Arc<ImageDetails>)> {
        self.ctx.require_identity()?;
        let (media, details) = self.store.create_image(input).await.into_domain()?;
        Ok((self.remember_one(media), self.remember_one(details)))
    }

    /// `Mutation.createVideo`
    #[instrument(skip(self, input), fields(filename = %input.filename))]
    pub async fn create_video(
        &self,
        input: NewVideo,
    ) -> DomainResult<(Arc<Media>, Arc<VideoDetails>)> {
        self.ctx.require_identity()?;
        let (media, details) = self.store.create_video(input).await.into_domain()?;
        Ok((self.remember_one(media), self.remember_one(details)))
    }
}
