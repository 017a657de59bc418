//! In-process cache backed by moka.

use crate::{CacheConfig, CacheEntry, Coalescer, KeyedCache};
use async_trait::async_trait;
use futures::future::BoxFuture;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tally_error::TallyResult;
use tracing::{debug, error, instrument};

/// Expires each entry after its own TTL.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(*value.ttl())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(*value.ttl())
    }
}

/// Bounded in-process cache with per-entry TTL.
///
/// Entries past their TTL are never returned, even before moka gets round to evicting
/// them. At capacity, moka's TinyLFU policy picks the victim.
pub struct MemoryCache {
    entries: Cache<String, CacheEntry>,
    coalescer: Coalescer,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .field("in_flight", &self.coalescer.in_flight())
            .finish()
    }
}

impl MemoryCache {
    /// Create a cache holding at most `config.max_size()` entries.
    pub fn new(config: &CacheConfig) -> Self {
        debug!(max_size = config.max_size(), "Creating in-process cache");
        let entries = Cache::builder()
            .max_capacity(*config.max_size())
            .expire_after(EntryExpiry)
            .build();
        Self {
            entries,
            coalescer: Coalescer::new(),
        }
    }

    /// Approximate number of live entries.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

#[async_trait]
impl KeyedCache for MemoryCache {
    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> TallyResult<()> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_raw(&self, key: &str) -> TallyResult<Option<String>> {
        match self.entries.get(key).await {
            Some(entry) if entry.is_expired() => {
                debug!("Entry expired");
                self.entries.invalidate(key).await;
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.into_value())),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, compute))]
    async fn once_raw<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, TallyResult<String>>,
    ) -> TallyResult<String> {
        if let Some(hit) = self.get_raw(key).await? {
            return Ok(hit);
        }
        self.coalescer
            .run(key, || async move {
                // A flight that landed just before this one started has already stored it.
                if let Some(hit) = self.get_raw(key).await? {
                    return Ok(hit);
                }
                let value = compute.await?;
                if let Err(e) = self.set_raw(key, value.clone(), ttl).await {
                    error!(error = %e, "Failed to store computed value");
                }
                Ok(value)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> TallyResult<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
