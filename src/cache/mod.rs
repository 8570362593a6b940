//! Cache-aside layer.
//!
//! - [`store`]: byte-level key/value backends (Redis lives in `infra::redis`)
//! - [`keys`]: singleton, collection and role key scheme
//! - [`adapter`]: typed per-entity access that turns cache failures into misses
//! - [`fanout`]: which namespaces a mutation purges
//! - [`role`]: authorization role cache
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"
//! default_ttl_seconds = 300
//! role_ttl_seconds = 600
//! call_timeout_ms = 2000
//!
//! [cache.ttl_seconds]
//! item = 60
//! ```

pub mod adapter;
mod config;
pub mod fanout;
pub mod keys;
pub mod role;
pub mod store;

pub use adapter::EntityCache;
pub use config::CacheConfig;
pub use fanout::{Dependent, InvalidationPlan};
pub use keys::Namespace;
pub use role::RoleCache;
pub use store::{CacheCalls, CacheError, CacheStore, MemoryCacheStore};
