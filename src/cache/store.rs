//! Key/value cache backends.
//!
//! The store deals in opaque bytes with a per-entry TTL. Transport errors are
//! surfaced here and collapsed into misses one layer up, in
//! [`EntityCache`](crate::cache::adapter::EntityCache).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache transport error: {0}")]
    Transport(String),
    #[error("cache call timed out")]
    Timeout,
    #[error("cache value could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Unconditional overwrite.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether a key was removed; absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Deletes every key starting with `prefix`, one key at a time. Not
    /// atomic: a concurrent `set` under the prefix may survive. Returns the
    /// number of keys removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;
}

/// Per-operation call counts of a [`MemoryCacheStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCalls {
    pub get: u64,
    pub set: u64,
    pub delete: u64,
    pub delete_prefix: u64,
}

impl CacheCalls {
    pub fn total(&self) -> u64 {
        self.get + self.set + self.delete + self.delete_prefix
    }
}

#[derive(Debug, Default)]
struct Counters {
    get: AtomicU64,
    set: AtomicU64,
    delete: AtomicU64,
    delete_prefix: AtomicU64,
}

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Process-local cache store.
///
/// Backs single-instance deployments and tests. Expiry is checked lazily on
/// read against the tokio clock, so paused-time tests can advance past a TTL.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<DashMap<String, Entry>>,
    counters: Arc<Counters>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> CacheCalls {
        CacheCalls {
            get: self.counters.get.load(Ordering::Relaxed),
            set: self.counters.set.load(Ordering::Relaxed),
            delete: self.counters.delete.load(Ordering::Relaxed),
            delete_prefix: self.counters.delete_prefix.load(Ordering::Relaxed),
        }
    }

    /// Make every subsequent `get` fail with a transport error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make every subsequent `set`, `delete` and `delete_prefix` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Whether a live entry exists, without touching the counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Live keys, sorted. Does not touch the counters.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Raw value write that bypasses counters and fault injection.
    pub fn insert_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn check_writable(&self) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(CacheError::Transport("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.counters.get.fetch_add(1, Ordering::Relaxed);
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(CacheError::Transport("injected read failure".to_string()));
        }

        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        self.counters.set.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        self.insert_raw(key, value, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.counters.delete.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.expires_at > now))
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        self.counters.delete_prefix.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;

        let matched: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in matched {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = MemoryCacheStore::new();
        store.set("rule:1", b"{}".to_vec(), TTL).await.expect("set");

        assert_eq!(
            store.get("rule:1").await.expect("get"),
            Some(b"{}".to_vec())
        );
        assert_eq!(store.get("rule:2").await.expect("get"), None);
        assert_eq!(
            store.calls(),
            CacheCalls {
                get: 2,
                set: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCacheStore::new();
        store
            .set("rule:1", b"1".to_vec(), Duration::from_secs(5))
            .await
            .expect("set");

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.get("rule:1").await.expect("get").is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("rule:1").await.expect("get").is_none());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn delete_prefix_only_removes_matching_keys() {
        let store = MemoryCacheStore::new();
        for key in ["items:o.a", "items:o.a:q.1", "items:o.b", "item:1"] {
            store.insert_raw(key, Vec::new(), TTL);
        }

        let removed = store.delete_prefix("items:o.a").await.expect("purge");

        assert_eq!(removed, 2);
        assert_eq!(store.keys(), vec!["item:1".to_string(), "items:o.b".to_string()]);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_live_key_was_removed() {
        let store = MemoryCacheStore::new();
        store.insert_raw("rule:1", Vec::new(), TTL);

        assert!(store.delete("rule:1").await.expect("delete"));
        assert!(!store.delete("rule:1").await.expect("delete"));
        assert!(!store.delete("rule:2").await.expect("delete"));
    }

    #[tokio::test]
    async fn injected_faults_surface_as_transport_errors() {
        let store = MemoryCacheStore::new();
        store.fail_reads(true);
        store.fail_writes(true);

        assert!(matches!(
            store.get("k").await,
            Err(CacheError::Transport(_))
        ));
        assert!(matches!(
            store.set("k", Vec::new(), TTL).await,
            Err(CacheError::Transport(_))
        ));
        assert!(matches!(
            store.delete_prefix("k").await,
            Err(CacheError::Transport(_))
        ));
        assert!(!store.contains("k"));
    }
}
