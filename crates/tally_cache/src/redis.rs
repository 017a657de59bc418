//! Redis-backed cache shared between processes.

use crate::{Coalescer, KeyedCache};
use async_trait::async_trait;
use futures::future::BoxFuture;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tally_error::{CacheError, CacheErrorKind, TallyResult};
use tracing::{debug, error, instrument, warn};

/// Cache stored in redis.
///
/// Every operation is a single command (`SET .. PX`, `GET`, `DEL`) on a shared
/// [`ConnectionManager`], which reconnects on its own.
///
/// `once` coalesces callers within this process only. Two processes missing on the same
/// key at the same moment may both compute it; the later write wins.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    coalescer: std::sync::Arc<Coalescer>,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("in_flight", &self.coalescer.in_flight())
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connect to the server at `url`.
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> TallyResult<Self> {
        let client = redis::Client::open(url).map_err(backend)?;
        let connection = client.get_connection_manager().await.map_err(backend)?;
        debug!("Connected to redis");
        Ok(Self {
            connection,
            coalescer: std::sync::Arc::new(Coalescer::new()),
        })
    }
}

fn backend(e: redis::RedisError) -> CacheError {
    CacheError::new(CacheErrorKind::Backend(e.to_string()))
}

#[async_trait]
impl KeyedCache for RedisCache {
    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> TallyResult<()> {
        let mut connection = self.connection.clone();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        connection
            .pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(backend)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_raw(&self, key: &str) -> TallyResult<Option<String>> {
        let mut connection = self.connection.clone();
        match connection.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(error = %e, "Redis read failed, treating as miss");
                Ok(None)
            }
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
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(key).await.map_err(backend)?;
        Ok(())
    }
}
