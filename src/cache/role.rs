//! Authorization role cache: `user_role:<user id>` → role name.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::warn;
use uuid::Uuid;

use crate::cache::adapter::bounded;
use crate::cache::config::CacheConfig;
use crate::cache::keys::user_role_key;
use crate::cache::store::{CacheError, CacheStore};

const METRIC_ROLE_HIT: &str = "menu_cache_role_hit_total";
const METRIC_ROLE_MISS: &str = "menu_cache_role_miss_total";

#[derive(Clone)]
pub struct RoleCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    timeout: Duration,
}

impl RoleCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: config.role_ttl,
            timeout: config.call_timeout,
        }
    }

    /// Cached role name. Errors and unreadable entries are misses.
    pub async fn get(&self, user_id: Uuid) -> Option<String> {
        let key = user_role_key(user_id);
        match bounded(self.timeout, self.store.get(&key)).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(role) if !role.is_empty() => {
                    counter!(METRIC_ROLE_HIT).increment(1);
                    Some(role)
                }
                _ => {
                    counter!(METRIC_ROLE_MISS).increment(1);
                    None
                }
            },
            Ok(None) => {
                counter!(METRIC_ROLE_MISS).increment(1);
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Role cache read failed; treating as miss");
                None
            }
        }
    }

    pub async fn set(&self, user_id: Uuid, role: &str) -> Result<(), CacheError> {
        let key = user_role_key(user_id);
        bounded(
            self.timeout,
            self.store.set(&key, role.as_bytes().to_vec(), self.ttl),
        )
        .await
    }

    pub async fn invalidate(&self, user_id: Uuid) -> Result<(), CacheError> {
        let key = user_role_key(user_id);
        bounded(self.timeout, self.store.delete(&key))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryCacheStore;

    #[tokio::test]
    async fn set_get_invalidate() {
        let store = MemoryCacheStore::new();
        let cache = RoleCache::new(Arc::new(store.clone()), &CacheConfig::default());
        let user = Uuid::new_v4();

        assert_eq!(cache.get(user).await, None);
        cache.set(user, "manager").await.expect("set");
        assert_eq!(cache.get(user).await.as_deref(), Some("manager"));
        assert!(store.contains(&format!("user_role:{user}")));

        cache.invalidate(user).await.expect("invalidate");
        assert_eq!(cache.get(user).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_with_role_ttl() {
        let store = MemoryCacheStore::new();
        let config = CacheConfig {
            role_ttl: Duration::from_secs(10),
            ..CacheConfig::default()
        };
        let cache = RoleCache::new(Arc::new(store), &config);
        let user = Uuid::new_v4();

        cache.set(user, "waiter").await.expect("set");
        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(cache.get(user).await, None);
    }
}
