//! Cache configuration.
//!
//! Built once from [`crate::config::CacheSettings`] at process start and
//! handed to every orchestrator; the `enabled` flag is read at construction
//! time only.

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::types::EntityKind;

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_ROLE_TTL_SECS: u64 = 600;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Route reads and writes through the cache store.
    pub enabled: bool,
    /// TTL applied to kinds without an override.
    pub default_ttl: Duration,
    /// Per-kind TTL overrides.
    pub entity_ttl: HashMap<EntityKind, Duration>,
    /// TTL of `user_role:<id>` entries.
    pub role_ttl: Duration,
    /// Upper bound for any single cache or storage call.
    pub call_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            entity_ttl: HashMap::new(),
            role_ttl: Duration::from_secs(DEFAULT_ROLE_TTL_SECS),
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: settings.default_ttl,
            entity_ttl: settings.entity_ttl.clone(),
            role_ttl: settings.role_ttl,
            call_timeout: settings.call_timeout,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn ttl_for(&self, kind: EntityKind) -> Duration {
        self.entity_ttl
            .get(&kind)
            .copied()
            .unwrap_or(self.default_ttl)
    }
}
