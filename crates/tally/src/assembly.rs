//! Wiring configuration and collaborators into a dispatcher.

use crate::TallyConfig;
use std::sync::Arc;
use tally_cache::{CacheConfig, KeyedCache, MemoryCache};
use tally_error::TallyResult;
use tally_workflow::{Collaborators, TriggerDispatcher, TriggerTable, VerificationWorkflow};
use tracing::{info, instrument, warn};

/// Pick the cache backend.
///
/// A configured `redis_url` selects redis when the crate is built with the `redis`
/// feature. If the server cannot be reached the in-process cache is used instead, so a
/// cache outage never blocks startup.
#[instrument(skip(config), fields(redis = config.redis_url().is_some()))]
pub async fn cache_backend(config: &CacheConfig) -> Arc<dyn KeyedCache> {
    match config.redis_url() {
        #[cfg(feature = "redis")]
        Some(url) => match tally_cache::RedisCache::connect(url).await {
            Ok(cache) => {
                info!("Using redis cache");
                return Arc::new(cache);
            }
            Err(e) => warn!(error = %e, "Redis unavailable, falling back to in-process cache"),
        },
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            warn!("redis_url is set but redis support is not compiled in, using in-process cache")
        }
        None => {}
    }

    info!(max_size = config.max_size(), "Using in-process cache");
    Arc::new(MemoryCache::new(config))
}

/// Build a dispatcher from configuration and the bot's collaborators.
///
/// # Errors
///
/// Fails when the configuration does not validate.
#[instrument(skip_all)]
pub async fn assemble(
    config: &TallyConfig,
    collaborators: Collaborators,
) -> TallyResult<TriggerDispatcher> {
    config.validate()?;
    let triggers = TriggerTable::from_config(config.triggers())?;
    let cache = cache_backend(config.cache()).await;
    let workflow = VerificationWorkflow::new(
        config.workflow().clone(),
        triggers,
        collaborators,
        cache,
        config.cache().operation_timeout(),
    );
    Ok(TriggerDispatcher::new(Arc::new(workflow)))
}
