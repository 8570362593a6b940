//! Role lookup for the RBAC layer.
//!
//! Policy evaluation lives with the delivery layer; this service only answers
//! "which role does this user hold", read through the role cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{EntityStore, RepoError};
use crate::cache::{CacheConfig, CacheStore, RoleCache};
use crate::domain::entities::UserRecord;
use crate::domain::types::{EntityKind, Scope};

#[derive(Clone)]
pub struct AuthorizationService {
    users: Arc<dyn EntityStore<UserRecord>>,
    cache: Option<RoleCache>,
    timeout: Duration,
}

impl AuthorizationService {
    pub fn new(
        users: Arc<dyn EntityStore<UserRecord>>,
        cache_store: Arc<dyn CacheStore>,
        config: &CacheConfig,
    ) -> Self {
        let cache = config
            .enabled
            .then(|| RoleCache::new(cache_store, config));
        Self {
            users,
            cache,
            timeout: config.call_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn role_for(&self, user_id: Uuid) -> Result<String, AppError> {
        if let Some(cache) = &self.cache
            && let Some(role) = cache.get(user_id).await
        {
            return Ok(role);
        }

        let user = match tokio::time::timeout(
            self.timeout,
            self.users.get_one(Scope::Global, user_id),
        )
        .await
        {
            Ok(result) => result.map_err(|err| {
                AppError::storage(EntityKind::User.as_str(), "role_for", err)
            })?,
            Err(_) => {
                return Err(AppError::storage(
                    EntityKind::User.as_str(),
                    "role_for",
                    RepoError::Timeout,
                ));
            }
        };
        let user = user.ok_or(AppError::NotFound {
            entity: EntityKind::User.as_str(),
        })?;

        if let Some(cache) = &self.cache
            && let Err(err) = cache.set(user_id, &user.role).await
        {
            warn!(user_id = %user_id, error = %err, "Failed to cache user role");
        }
        Ok(user.role)
    }

    /// Drop the cached role of `user_id`.
    pub async fn forget(&self, user_id: Uuid) -> Result<(), AppError> {
        match &self.cache {
            Some(cache) => Ok(cache.invalidate(user_id).await?),
            None => Ok(()),
        }
    }
}
