//! Namespaced views over a shared cache.

use crate::KeyedCache;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tally_error::TallyResult;

/// A cache that prefixes every key with `prefix:` before handing it to the inner cache.
///
/// Two named caches with different prefixes never see each other's keys, even when
/// they share the same backend. `once` goes straight through under the prefixed key,
/// so coalescing works exactly as on the inner cache.
#[derive(Clone)]
pub struct NamedCache {
    prefix: String,
    inner: Arc<dyn KeyedCache>,
}

impl std::fmt::Debug for NamedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl NamedCache {
    /// Wrap `inner` under `prefix`.
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn KeyedCache>) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    /// Namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key as stored in the inner cache.
    pub fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl KeyedCache for NamedCache {
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> TallyResult<()> {
        self.inner.set_raw(&self.full_key(key), value, ttl).await
    }

    async fn get_raw(&self, key: &str) -> TallyResult<Option<String>> {
        self.inner.get_raw(&self.full_key(key)).await
    }

    async fn once_raw<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, TallyResult<String>>,
    ) -> TallyResult<String> {
        let full_key = self.full_key(key);
        self.inner.once_raw(&full_key, ttl, compute).await
    }

    async fn remove(&self, key: &str) -> TallyResult<()> {
        self.inner.remove(&self.full_key(key)).await
    }
}
