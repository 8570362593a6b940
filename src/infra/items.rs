//! Item reads with embedded children.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::application::inputs::{CreateItemInput, UpdateItemInput};
use crate::application::repos::{EntityStore, ListParams, RepoError};
use crate::domain::entities::{CommentRecord, ImageRecord, ItemRecord, SpecificationRecord};
use crate::domain::types::Scope;

/// Wraps the item store so every item read carries its images, comments and
/// specifications. Writes pass through untouched.
#[derive(Clone)]
pub struct ItemAssembler {
    items: Arc<dyn EntityStore<ItemRecord>>,
    images: Arc<dyn EntityStore<ImageRecord>>,
    comments: Arc<dyn EntityStore<CommentRecord>>,
    specifications: Arc<dyn EntityStore<SpecificationRecord>>,
}

impl ItemAssembler {
    pub fn new(
        items: Arc<dyn EntityStore<ItemRecord>>,
        images: Arc<dyn EntityStore<ImageRecord>>,
        comments: Arc<dyn EntityStore<CommentRecord>>,
        specifications: Arc<dyn EntityStore<SpecificationRecord>>,
    ) -> Self {
        Self {
            items,
            images,
            comments,
            specifications,
        }
    }

    async fn assemble(&self, mut item: ItemRecord) -> Result<ItemRecord, RepoError> {
        let scope = Scope::Organization(item.organization_id);
        let params = ListParams::for_item(item.id);
        let (images, comments, specifications) = tokio::try_join!(
            self.images.get_all(scope, &params),
            self.comments.get_all(scope, &params),
            self.specifications.get_all(scope, &params),
        )?;
        item.images = images;
        item.comments = comments;
        item.specifications = specifications;
        Ok(item)
    }
}

#[async_trait]
impl EntityStore<ItemRecord> for ItemAssembler {
    async fn get_all(
        &self,
        scope: Scope,
        params: &ListParams,
    ) -> Result<Vec<ItemRecord>, RepoError> {
        let items = self.items.get_all(scope, params).await?;
        try_join_all(items.into_iter().map(|item| self.assemble(item))).await
    }

    async fn get_one(&self, scope: Scope, id: Uuid) -> Result<Option<ItemRecord>, RepoError> {
        match self.items.get_one(scope, id).await? {
            Some(item) => self.assemble(item).await.map(Some),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        scope: Scope,
        input: CreateItemInput,
    ) -> Result<Uuid, RepoError> {
        self.items.create(scope, input).await
    }

    async fn update(
        &self,
        scope: Scope,
        input: UpdateItemInput,
    ) -> Result<(), RepoError> {
        self.items.update(scope, input).await
    }

    async fn delete(&self, scope: Scope, id: Uuid, actor: Uuid) -> Result<(), RepoError> {
        self.items.delete(scope, id, actor).await
    }
}
