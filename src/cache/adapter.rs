//! Typed cache access for one entity kind.
//!
//! Reads never fail: transport errors, timeouts and undecodable entries are
//! logged and reported as misses. Writes and purges return their error so the
//! caller decides how much of it matters.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::entity::Entity;
use crate::cache::config::CacheConfig;
use crate::cache::fanout::InvalidationPlan;
use crate::cache::keys::Namespace;
use crate::cache::store::{CacheError, CacheStore};

const METRIC_HIT: &str = "menu_cache_hit_total";
const METRIC_MISS: &str = "menu_cache_miss_total";
const METRIC_ERROR: &str = "menu_cache_error_total";
const METRIC_PURGED: &str = "menu_cache_purged_keys_total";
const METRIC_PURGE_MS: &str = "menu_cache_purge_ms";

/// Bound a cache call by `timeout`.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, CacheError>>,
) -> Result<T, CacheError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| CacheError::Timeout)?
}

pub struct EntityCache<E> {
    store: Arc<dyn CacheStore>,
    namespace: Namespace,
    ttl: Duration,
    timeout: Duration,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace,
            ttl: self.ttl,
            timeout: self.timeout,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            namespace: Namespace::of(E::KIND),
            ttl: config.ttl_for(E::KIND),
            timeout: config.call_timeout,
            _entity: PhantomData,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_one(&self, id: Uuid) -> Option<E> {
        let key = self.namespace.singleton_key(id);
        let value: E = self.read(&key).await?;
        if value.is_blank() {
            debug!(entity = %E::KIND, key = %key, "Cached value has a nil id; treating as miss");
            return None;
        }
        Some(value)
    }

    pub async fn get_all(&self, key: &str) -> Option<Vec<E>> {
        self.read(key).await
    }

    pub async fn put_one(&self, value: &E) -> Result<(), CacheError> {
        let key = self.namespace.singleton_key(value.id());
        self.write(&key, value).await
    }

    pub async fn put_all(&self, key: &str, values: &[E]) -> Result<(), CacheError> {
        self.write(key, values).await
    }

    pub async fn remove_one(&self, id: Uuid) -> Result<(), CacheError> {
        let key = self.namespace.singleton_key(id);
        bounded(self.timeout, self.store.delete(&key))
            .await
            .map(|_| ())
            .inspect_err(|_| self.record_error("delete"))
    }

    /// Execute every purge in `plan`.
    ///
    /// All steps are attempted even after a failure; the first error is
    /// returned once the plan has run.
    pub async fn apply(&self, plan: &InvalidationPlan) -> Result<usize, CacheError> {
        let started_at = Instant::now();
        let mut removed = 0;
        let mut first_error = None;

        for key in &plan.keys {
            match bounded(self.timeout, self.store.delete(key)).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    self.record_error("delete");
                    first_error.get_or_insert(err);
                }
            }
        }

        for prefix in &plan.prefixes {
            match bounded(self.timeout, self.store.delete_prefix(prefix)).await {
                Ok(count) => removed += count,
                Err(err) => {
                    self.record_error("delete_prefix");
                    first_error.get_or_insert(err);
                }
            }
        }

        counter!(METRIC_PURGED, "entity" => E::KIND.as_str()).increment(removed as u64);
        histogram!(METRIC_PURGE_MS, "entity" => E::KIND.as_str())
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
        debug!(
            entity = %E::KIND,
            keys = plan.keys.len(),
            prefixes = plan.prefixes.len(),
            removed,
            "Cache invalidation applied"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match bounded(self.timeout, self.store.get(key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                counter!(METRIC_MISS, "entity" => E::KIND.as_str()).increment(1);
                return None;
            }
            Err(err) => {
                self.record_error("get");
                warn!(entity = %E::KIND, key = %key, error = %err, "Cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                counter!(METRIC_HIT, "entity" => E::KIND.as_str()).increment(1);
                Some(value)
            }
            Err(err) => {
                self.record_error("decode");
                warn!(entity = %E::KIND, key = %key, error = %err, "Corrupt cache entry; removing");
                if let Err(err) = bounded(self.timeout, self.store.delete(key)).await {
                    warn!(entity = %E::KIND, key = %key, error = %err, "Failed to remove corrupt cache entry");
                }
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        bounded(self.timeout, self.store.set(key, bytes, self.ttl))
            .await
            .inspect_err(|_| self.record_error("set"))
    }

    fn record_error(&self, op: &'static str) {
        counter!(METRIC_ERROR, "entity" => E::KIND.as_str(), "op" => op).increment(1);
    }
}
