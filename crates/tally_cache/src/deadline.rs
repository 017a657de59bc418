//! Deadlines for cache operations.

use std::future::Future;
use std::time::Duration;
use tally_error::{CacheError, CacheErrorKind, TallyResult};

/// Run a cache operation, failing with [`CacheErrorKind::Timeout`] past the deadline.
///
/// The operation future is dropped on timeout, so nothing it had not yet written lands.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, fut: F) -> TallyResult<T>
where
    F: Future<Output = TallyResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, ?deadline, "Cache operation timed out");
            Err(CacheError::new(CacheErrorKind::Timeout(operation.to_string())).into())
        }
    }
}
