//! Artifact identity to session lookup.

use crate::codec::{self, CodecResult};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tally_cache::{KeyedCache, KeyedCacheExt, NamedCache, with_deadline};
use tally_core::{ArtifactIdentity, DomainFields, RenderedState, SessionHandle};
use tally_error::TallyResult;
use tracing::{debug, instrument, warn};

/// Cache namespace for review sessions.
pub const DIALOG_NAMESPACE: &str = "dialog";

/// What the index stores per artifact: the handle plus the last rendered fields, so a
/// hit alone is enough to resume a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SessionEntry {
    handle: SessionHandle,
    fields: DomainFields,
}

/// Where a resolved session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionSource {
    /// Cache hit
    Cache,
    /// Decoded from the artifact's rendering
    Artifact,
}

/// A session found for an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ResolvedSession {
    handle: SessionHandle,
    fields: DomainFields,
    source: SessionSource,
    /// Set when the cache could not be written while recovering
    cache_degraded: bool,
}

impl ResolvedSession {
    /// Split into handle and fields.
    pub fn into_parts(self) -> (SessionHandle, DomainFields) {
        (self.handle, self.fields)
    }
}

/// Maps artifact identities to review sessions.
///
/// The cache is only an accelerator. Every failure reading it is logged and treated as
/// a miss, after which callers fall back to [`SessionIndex::recover`].
#[derive(Debug, Clone)]
pub struct SessionIndex {
    cache: NamedCache,
    session_ttl: Duration,
    operation_timeout: Duration,
}

impl SessionIndex {
    /// Index sessions in the `dialog` namespace of `cache`.
    pub fn new(cache: Arc<dyn KeyedCache>, session_ttl: Duration, operation_timeout: Duration) -> Self {
        Self {
            cache: NamedCache::new(DIALOG_NAMESPACE, cache),
            session_ttl,
            operation_timeout,
        }
    }

    /// Cached session for an artifact.
    #[instrument(skip(self), fields(correlation_key = %identity.correlation_key()))]
    pub async fn resolve(&self, identity: &ArtifactIdentity) -> Option<ResolvedSession> {
        let key = identity.correlation_key();
        let lookup = with_deadline(
            "resolve",
            self.operation_timeout,
            self.cache.get::<SessionEntry>(&key),
        )
        .await;

        match lookup {
            Ok(Some(entry)) if entry.handle.is_consistent() && entry.handle.identity() == identity => {
                debug!("Session cache hit");
                Some(ResolvedSession {
                    handle: entry.handle,
                    fields: entry.fields,
                    source: SessionSource::Cache,
                    cache_degraded: false,
                })
            }
            Ok(Some(_)) => {
                warn!("Cached session does not belong to this artifact, ignoring it");
                None
            }
            Ok(None) => {
                debug!("Session cache miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "Session cache unavailable, treating as miss");
                None
            }
        }
    }

    /// Rebuild a session from the artifact's rendering and put it back in the cache
    /// unless it is already finished.
    ///
    /// Failing to write the cache does not fail recovery; it is flagged on the result.
    #[instrument(skip(self, rendering), fields(correlation_key = %identity.correlation_key()))]
    pub async fn recover(
        &self,
        identity: &ArtifactIdentity,
        rendering: &RenderedState,
    ) -> CodecResult<ResolvedSession> {
        let (handle, fields) = codec::decode(identity, rendering)?;
        // Finished sessions are never cached.
        let cache_degraded = if fields.state.is_terminal() {
            false
        } else {
            match self.persist(&handle, &fields).await {
                Ok(()) => false,
                Err(e) => {
                    warn!(error = %e, "Could not repopulate session cache");
                    true
                }
            }
        };
        debug!(subject_id = handle.subject_id(), "Session recovered from artifact");
        Ok(ResolvedSession {
            handle,
            fields,
            source: SessionSource::Artifact,
            cache_degraded,
        })
    }

    /// Store the session for its artifact.
    #[instrument(skip(self, fields), fields(correlation_key = %handle.correlation_key()))]
    pub async fn persist(&self, handle: &SessionHandle, fields: &DomainFields) -> TallyResult<()> {
        let entry = SessionEntry {
            handle: handle.clone(),
            fields: fields.clone(),
        };
        with_deadline(
            "persist",
            self.operation_timeout,
            self.cache.set(handle.correlation_key(), &entry, self.session_ttl),
        )
        .await
    }

    /// Forget the session for an artifact. Forgetting twice is fine.
    #[instrument(skip(self), fields(correlation_key = %handle.correlation_key()))]
    pub async fn invalidate(&self, handle: &SessionHandle) -> TallyResult<()> {
        with_deadline(
            "invalidate",
            self.operation_timeout,
            self.cache.remove(handle.correlation_key()),
        )
        .await
    }
}
