//! One orchestrator per entity kind, wired against shared backends.

use std::sync::Arc;

use crate::application::authz::AuthorizationService;
use crate::application::error::AppError;
use crate::application::repos::EntityStore;
use crate::application::service::CachedService;
use crate::cache::{CacheConfig, CacheStore};
use crate::domain::entities::*;
use crate::domain::types::{EntityKind, Scope};

/// Source-of-truth stores for every kind.
#[derive(Clone)]
pub struct Stores {
    pub organizations: Arc<dyn EntityStore<OrganizationRecord>>,
    pub categories: Arc<dyn EntityStore<CategoryRecord>>,
    pub items: Arc<dyn EntityStore<ItemRecord>>,
    pub tables: Arc<dyn EntityStore<TableRecord>>,
    pub orders: Arc<dyn EntityStore<OrderRecord>>,
    pub images: Arc<dyn EntityStore<ImageRecord>>,
    pub comments: Arc<dyn EntityStore<CommentRecord>>,
    pub specifications: Arc<dyn EntityStore<SpecificationRecord>>,
    pub rules: Arc<dyn EntityStore<RuleRecord>>,
    pub messages: Arc<dyn EntityStore<MessageRecord>>,
    pub users: Arc<dyn EntityStore<UserRecord>>,
    pub roles: Arc<dyn EntityStore<RoleRecord>>,
}

#[derive(Clone)]
pub struct MenuServices {
    pub organizations: CachedService<OrganizationRecord>,
    pub categories: CachedService<CategoryRecord>,
    pub items: CachedService<ItemRecord>,
    pub tables: CachedService<TableRecord>,
    pub orders: CachedService<OrderRecord>,
    pub images: CachedService<ImageRecord>,
    pub comments: CachedService<CommentRecord>,
    pub specifications: CachedService<SpecificationRecord>,
    pub rules: CachedService<RuleRecord>,
    pub messages: CachedService<MessageRecord>,
    pub users: CachedService<UserRecord>,
    pub roles: CachedService<RoleRecord>,
    pub authz: AuthorizationService,
}

impl MenuServices {
    pub fn new(stores: Stores, cache_store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        let cache = || cache_store.clone();
        Self {
            organizations: CachedService::new(stores.organizations, cache(), config),
            categories: CachedService::new(stores.categories, cache(), config),
            items: CachedService::new(stores.items, cache(), config),
            tables: CachedService::new(stores.tables, cache(), config),
            orders: CachedService::new(stores.orders, cache(), config),
            images: CachedService::new(stores.images, cache(), config),
            comments: CachedService::new(stores.comments, cache(), config),
            specifications: CachedService::new(stores.specifications, cache(), config),
            rules: CachedService::new(stores.rules, cache(), config),
            messages: CachedService::new(stores.messages, cache(), config),
            authz: AuthorizationService::new(stores.users.clone(), cache(), config),
            users: CachedService::new(stores.users, cache(), config),
            roles: CachedService::new(stores.roles, cache(), config),
        }
    }

    /// Force-purge one kind's namespace by name.
    pub async fn invalidate(&self, kind: EntityKind, scope: Scope) -> Result<usize, AppError> {
        match kind {
            EntityKind::Organization => self.organizations.invalidate(scope).await,
            EntityKind::Category => self.categories.invalidate(scope).await,
            EntityKind::Item => self.items.invalidate(scope).await,
            EntityKind::Table => self.tables.invalidate(scope).await,
            EntityKind::Order => self.orders.invalidate(scope).await,
            EntityKind::Image => self.images.invalidate(scope).await,
            EntityKind::Comment => self.comments.invalidate(scope).await,
            EntityKind::Specification => self.specifications.invalidate(scope).await,
            EntityKind::Rule => self.rules.invalidate(scope).await,
            EntityKind::Message => self.messages.invalidate(scope).await,
            EntityKind::User => self.users.invalidate(scope).await,
            EntityKind::Role => self.roles.invalidate(scope).await,
        }
    }
}
