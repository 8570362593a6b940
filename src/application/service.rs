//! Cache-aside orchestrator for one entity kind.
//!
//! Storage is the source of truth. Reads go through the cache and populate it
//! on a miss; writes go to storage first, then overwrite the singleton entry
//! and purge every collection that could contain the row. Cache failures never
//! fail a request, storage failures always do.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::application::entity::Entity;
use crate::application::error::AppError;
use crate::application::inputs::{CreateInput, UpdateInput};
use crate::application::repos::{EntityStore, ListParams, RepoError};
use crate::cache::fanout::{InvalidationPlan, needs_parent};
use crate::cache::{CacheConfig, CacheStore, EntityCache};
use crate::domain::error::DomainError;
use crate::domain::types::Scope;

pub struct CachedService<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    cache: Option<EntityCache<E>>,
    timeout: Duration,
}

impl<E: Entity> Clone for CachedService<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            timeout: self.timeout,
        }
    }
}

impl<E: Entity> CachedService<E> {
    /// `config.enabled` is read here once; a disabled service never touches
    /// `cache_store`.
    pub fn new(
        store: Arc<dyn EntityStore<E>>,
        cache_store: Arc<dyn CacheStore>,
        config: &CacheConfig,
    ) -> Self {
        let cache = config
            .enabled
            .then(|| EntityCache::new(cache_store, config));
        Self {
            store,
            cache,
            timeout: config.call_timeout,
        }
    }

    pub fn uncached(store: Arc<dyn EntityStore<E>>, timeout: Duration) -> Self {
        Self {
            store,
            cache: None,
            timeout,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    #[instrument(skip(self, params), fields(entity = %E::KIND))]
    pub async fn get_all(&self, scope: Scope, params: &ListParams) -> Result<Vec<E>, AppError> {
        let Some(cache) = &self.cache else {
            return self
                .storage("get_all", self.store.get_all(scope, params))
                .await;
        };

        let key = cache.namespace().collection_key(scope, params);
        if let Some(values) = cache.get_all(&key).await {
            return Ok(values);
        }

        let values = self
            .storage("get_all", self.store.get_all(scope, params))
            .await?;
        if let Err(err) = cache.put_all(&key, &values).await {
            warn!(entity = %E::KIND, key = %key, error = %err, "Failed to populate collection cache");
        }
        Ok(values)
    }

    #[instrument(skip(self), fields(entity = %E::KIND))]
    pub async fn get_one(&self, scope: Scope, id: Uuid) -> Result<E, AppError> {
        let Some(cache) = &self.cache else {
            return self.read_canonical("get_one", scope, id).await;
        };

        if let Some(value) = cache.get_one(id).await {
            if visible(scope, &value) {
                return Ok(value);
            }
            return Err(AppError::NotFound {
                entity: E::KIND.as_str(),
            });
        }

        let value = self.read_canonical("get_one", scope, id).await?;
        if let Err(err) = cache.put_one(&value).await {
            warn!(entity = %E::KIND, id = %id, error = %err, "Failed to populate singleton cache");
        }
        Ok(value)
    }

    #[instrument(skip(self, input), fields(entity = %E::KIND))]
    pub async fn create(&self, scope: Scope, input: E::Create) -> Result<Uuid, AppError> {
        input.validate()?;

        let id = self
            .storage("create", self.store.create(scope, input))
            .await?;

        if let Some(cache) = &self.cache {
            let canonical = self.reread(scope, id).await?;
            self.write_through(cache, scope, &canonical).await;
        }

        debug!(entity = %E::KIND, id = %id, "Created");
        Ok(id)
    }

    #[instrument(skip(self, input), fields(entity = %E::KIND))]
    pub async fn update(&self, scope: Scope, input: E::Update) -> Result<(), AppError> {
        if input.is_empty() {
            return Err(DomainError::EmptyUpdate {
                entity: E::KIND.as_str(),
            }
            .into());
        }
        input.validate()?;

        let id = input.id();
        self.storage("update", self.store.update(scope, input))
            .await?;

        if let Some(cache) = &self.cache {
            let canonical = self.reread(scope, id).await?;
            self.write_through(cache, scope, &canonical).await;
        }

        debug!(entity = %E::KIND, id = %id, "Updated");
        Ok(())
    }

    #[instrument(skip(self), fields(entity = %E::KIND))]
    pub async fn delete(&self, scope: Scope, id: Uuid, actor: Uuid) -> Result<(), AppError> {
        let prior = match &self.cache {
            Some(_) if needs_parent(E::KIND) => {
                self.storage("get_one", self.store.get_one(scope, id))
                    .await?
            }
            _ => None,
        };

        self.storage("delete", self.store.delete(scope, id, actor))
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.remove_one(id).await {
                warn!(entity = %E::KIND, id = %id, error = %err, "Failed to remove singleton cache entry");
            }
            let plan = InvalidationPlan::for_mutation(scope, id, prior.as_ref());
            if let Err(err) = cache.apply(&plan).await {
                warn!(entity = %E::KIND, id = %id, error = %err, "Cache invalidation after delete incomplete");
            }
        }

        debug!(entity = %E::KIND, id = %id, "Deleted");
        Ok(())
    }

    /// Purge every cached singleton and collection of this kind in `scope`,
    /// plus the namespaces that embed it. Errors are returned.
    #[instrument(skip(self), fields(entity = %E::KIND))]
    pub async fn invalidate(&self, scope: Scope) -> Result<usize, AppError> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        let plan = InvalidationPlan::for_namespace(E::KIND, scope);
        Ok(cache.apply(&plan).await?)
    }

    /// Overwrite the singleton entry and purge dependent namespaces.
    async fn write_through(&self, cache: &EntityCache<E>, scope: Scope, canonical: &E) {
        let id = canonical.id();
        if let Err(err) = cache.put_one(canonical).await {
            warn!(entity = %E::KIND, id = %id, error = %err, "Failed to write singleton cache entry");
            if let Err(err) = cache.remove_one(id).await {
                warn!(entity = %E::KIND, id = %id, error = %err, "Failed to drop stale singleton cache entry");
            }
        }

        let plan = InvalidationPlan::for_mutation(scope, id, Some(canonical));
        if let Err(err) = cache.apply(&plan).await {
            warn!(entity = %E::KIND, id = %id, error = %err, "Cache invalidation after write incomplete");
        }
    }

    async fn read_canonical(&self, op: &'static str, scope: Scope, id: Uuid) -> Result<E, AppError> {
        self.storage(op, self.store.get_one(scope, id))
            .await?
            .ok_or(AppError::NotFound {
                entity: E::KIND.as_str(),
            })
    }

    /// Re-read after a write. The row was just written, so absence is an
    /// integrity failure rather than a not-found.
    async fn reread(&self, scope: Scope, id: Uuid) -> Result<E, AppError> {
        self.storage("reread", self.store.get_one(scope, id))
            .await?
            .ok_or_else(|| {
                AppError::storage(
                    E::KIND.as_str(),
                    "reread",
                    RepoError::Integrity {
                        message: format!("row {id} vanished after write"),
                    },
                )
            })
    }

    async fn storage<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, RepoError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|err| AppError::storage(E::KIND.as_str(), op, err)),
            Err(_) => Err(AppError::storage(E::KIND.as_str(), op, RepoError::Timeout)),
        }
    }
}

fn visible<E: Entity>(scope: Scope, value: &E) -> bool {
    !E::KIND.is_organization_scoped() || scope.admits(value.owner())
}
