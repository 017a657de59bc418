//! Cache traits.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;
use tally_error::{CacheError, CacheErrorKind, TallyResult};

/// Key/value store of serialized payloads with per-entry TTL.
///
/// Object safe, so callers can hold an `Arc<dyn KeyedCache>` and pick the backend at
/// startup. Typed access lives in [`KeyedCacheExt`].
///
/// A miss is `Ok(None)`, never an error.
#[async_trait]
pub trait KeyedCache: Send + Sync {
    /// Store a payload, overwriting any previous one.
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> TallyResult<()>;

    /// Payload under `key`, if present and not expired.
    async fn get_raw(&self, key: &str) -> TallyResult<Option<String>>;

    /// Payload under `key`, computing and storing it on a miss.
    ///
    /// Concurrent callers missing on the same key share one computation and all see its
    /// result, error included. Errors are not stored.
    async fn once_raw<'a>(
        &'a self,
        key: &'a str,
        ttl: Duration,
        compute: BoxFuture<'a, TallyResult<String>>,
    ) -> TallyResult<String>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> TallyResult<()>;
}

/// Typed access to any [`KeyedCache`], serializing values as JSON.
#[async_trait]
pub trait KeyedCacheExt: KeyedCache {
    /// Store a value.
    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> TallyResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let raw = encode(key, value)?;
        self.set_raw(key, raw, ttl).await
    }

    /// Read a value; a payload that does not decode is `CacheErrorKind::Decode`.
    async fn get<T>(&self, key: &str) -> TallyResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(key).await? {
            Some(raw) => decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Cached value, or the result of `compute` stored for `ttl`.
    async fn once<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> TallyResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = TallyResult<T>> + Send,
    {
        let owned_key = key.to_string();
        let raw = self
            .once_raw(
                key,
                ttl,
                Box::pin(async move {
                    let value = compute().await?;
                    encode(&owned_key, &value)
                }),
            )
            .await?;
        decode(key, &raw)
    }
}

impl<C: KeyedCache + ?Sized> KeyedCacheExt for C {}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> TallyResult<String> {
    serde_json::to_string(value).map_err(|e| {
        CacheError::new(CacheErrorKind::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })
        .into()
    })
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> TallyResult<T> {
    serde_json::from_str(raw).map_err(|e| {
        CacheError::new(CacheErrorKind::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })
        .into()
    })
}
