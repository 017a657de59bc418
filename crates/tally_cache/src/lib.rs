//! Keyed cache with TTL, namespacing and coalesced compute-once lookups.
//!
//! Two backends implement [`KeyedCache`]:
//! - [`MemoryCache`], bounded and in-process (moka)
//! - `RedisCache`, shared between processes (feature `redis`)
//!
//! Both coalesce concurrent [`KeyedCacheExt::once`] calls for the same key through a
//! [`Coalescer`], so a cold key is computed at most once per process no matter how many
//! handlers ask for it at the same time.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tally_cache::{CacheConfig, KeyedCacheExt, MemoryCache, NamedCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = Arc::new(MemoryCache::new(&CacheConfig::default()));
//! let meta = NamedCache::new("meta", cache);
//!
//! let role: Option<String> = meta
//!     .once("123:verification", Duration::from_secs(60), || async {
//!         Ok(Some("456".to_string()))
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(role.as_deref(), Some("456"));
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coalesce;
mod config;
mod deadline;
mod entry;
mod memory;
mod named;
#[cfg(feature = "redis")]
mod redis;
mod traits;

pub use coalesce::Coalescer;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use deadline::with_deadline;
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use named::NamedCache;
#[cfg(feature = "redis")]
pub use redis::RedisCache;
pub use traits::{KeyedCache, KeyedCacheExt};
