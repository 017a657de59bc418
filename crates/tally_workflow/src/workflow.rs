//! The verification workflow.

use crate::state::{self, Step};
use crate::{TriggerTable, WorkflowConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tally_cache::{KeyedCache, KeyedCacheExt, NamedCache, with_deadline};
use tally_core::{
    ArtifactIdentity, DomainFields, RenderedState, ReviewItem, ReviewState, SessionHandle,
    SessionKind, Subject, Trigger,
};
use tally_error::{StoreError, StoreErrorKind, TallyResult, WorkflowError, WorkflowErrorKind};
use tally_interface::{MemberDirectory, RecordStore, RenderingSurface};
use tally_session::{ResolvedSession, SessionIndex, codec};
use tracing::{debug, info, instrument, warn};

/// Cache namespace for permission lookups.
pub const META_NAMESPACE: &str = "meta";

/// Shown in place of a role that no longer resolves to a name.
const UNKNOWN_ROLE: &str = "Unknown Role";

/// Shown as the verifier when a verification is only known from the store.
const UNKNOWN_VERIFIER: &str = "Unknown Moderator";

/// Action name used in authorization failures.
const VERIFICATION_ACTION_LABEL: &str = "submission verification";

/// Published when a context has nothing left to review.
pub const NOTHING_PENDING: &str = "🎉 There are no pending submissions to be verified";

/// The external systems the workflow drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Store of record
    pub store: Arc<dyn RecordStore>,
    /// Chat platform
    pub surface: Arc<dyn RenderingSurface>,
    /// Guild members and roles
    pub directory: Arc<dyn MemberDirectory>,
}

/// What a trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The submission moved to a new state and its artifact was re-rendered
    Applied {
        /// Trigger that fired
        trigger: Trigger,
        /// State before
        from: ReviewState,
        /// State after
        to: ReviewState,
        /// Artifact that was re-rendered
        artifact: ArtifactIdentity,
        /// The session cache could not be updated
        cache_degraded: bool,
    },
    /// The next pending submission was published
    Published {
        /// New artifact
        artifact: ArtifactIdentity,
        /// Submission it shows
        subject_id: String,
        /// The session cache could not be updated
        cache_degraded: bool,
    },
    /// Nothing is left to review in the context
    Exhausted {
        /// Context that ran out
        context_id: String,
        /// Notice that was published
        artifact: ArtifactIdentity,
    },
    /// The submission was already finished; nothing was done
    AlreadyTerminal {
        /// Submission
        subject_id: String,
        /// State it is in
        state: ReviewState,
    },
}

/// Drives submissions through review.
///
/// Transitions never lock. Each one re-reads the submission from the store, so two
/// moderators clicking at once end up with one effect and one no-op.
pub struct VerificationWorkflow {
    config: WorkflowConfig,
    triggers: TriggerTable,
    collaborators: Collaborators,
    index: SessionIndex,
    meta: NamedCache,
    cache_timeout: Duration,
}

impl std::fmt::Debug for VerificationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationWorkflow")
            .field("config", &self.config)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl VerificationWorkflow {
    /// Assemble a workflow over a shared cache.
    pub fn new(
        config: WorkflowConfig,
        triggers: TriggerTable,
        collaborators: Collaborators,
        cache: Arc<dyn KeyedCache>,
        cache_timeout: Duration,
    ) -> Self {
        let index = SessionIndex::new(cache.clone(), config.session_ttl(), cache_timeout);
        Self {
            config,
            triggers,
            collaborators,
            index,
            meta: NamedCache::new(META_NAMESPACE, cache),
            cache_timeout,
        }
    }

    /// Workflow settings.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Trigger dispatch table.
    pub fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    /// Session index.
    pub fn index(&self) -> &SessionIndex {
        &self.index
    }

    /// Chat platform.
    pub fn surface(&self) -> &Arc<dyn RenderingSurface> {
        &self.collaborators.surface
    }

    /// Publish the first pending submission of a context into a channel.
    #[instrument(skip(self))]
    pub async fn start_review(
        &self,
        actor_id: &str,
        guild_id: &str,
        channel_id: &str,
        context_id: &str,
    ) -> TallyResult<TransitionOutcome> {
        self.authorize(guild_id, actor_id).await?;
        self.publish_next(guild_id, channel_id, context_id).await
    }

    /// Apply a trigger to a resolved session.
    #[instrument(
        skip(self, session),
        fields(
            correlation_key = %session.handle().correlation_key(),
            subject_id = %session.handle().subject_id(),
            source = %session.source(),
        )
    )]
    pub async fn apply(
        &self,
        actor_id: &str,
        trigger: Trigger,
        session: ResolvedSession,
    ) -> TallyResult<TransitionOutcome> {
        let degraded = *session.cache_degraded();
        let (handle, mut fields) = session.into_parts();
        if handle.kind() != SessionKind::Verification {
            return Err(WorkflowError::new(WorkflowErrorKind::InvalidTransition {
                state: handle.kind().to_string(),
                trigger: trigger.to_string(),
            })
            .into());
        }

        self.authorize(handle.guild_id(), actor_id).await?;

        let subject = self
            .store_call("subject", self.collaborators.store.subject(handle.subject_id()))
            .await?;
        let rendered = fields.state;
        let from = state::reconcile(fields.state, fields.score, subject.as_ref());
        if let Some(subject) = &subject {
            fields.refresh_from(subject);
        }
        if from != fields.state {
            debug!(rendered = %fields.state, stored = %from, "Rendering was stale");
            fields.state = from;
            if from != ReviewState::Verified {
                fields.verified_by = None;
            }
        }

        match state::step(from, trigger)? {
            Step::AlreadyTerminal => {
                info!(state = %from, "Submission already finished, ignoring trigger");
                self.settle(&handle, fields, rendered).await?;
                Ok(TransitionOutcome::AlreadyTerminal {
                    subject_id: handle.subject_id().to_string(),
                    state: from,
                })
            }
            Step::To(ReviewState::Verified) => {
                self.approve(actor_id, &handle, fields, from, degraded).await
            }
            Step::To(ReviewState::Rejected) => self.reject(&handle, fields, from, degraded).await,
            Step::To(ReviewState::Removed) => self.remove(&handle, fields, from, degraded).await,
            Step::To(other) => Err(WorkflowError::new(WorkflowErrorKind::InvalidTransition {
                state: from.to_string(),
                trigger: format!("{} to {}", trigger, other),
            })
            .into()),
            Step::PublishNext => {
                self.forget(&handle).await;
                self.publish_next(handle.guild_id(), handle.identity().channel_id(), handle.context_id())
                    .await
            }
        }
    }

    async fn approve(
        &self,
        actor_id: &str,
        handle: &SessionHandle,
        mut fields: DomainFields,
        from: ReviewState,
        degraded: bool,
    ) -> TallyResult<TransitionOutcome> {
        self.store_call(
            "mark_verified",
            self.collaborators.store.mark_verified(handle.subject_id()),
        )
        .await?;
        let forgotten = self.forget(handle).await;

        let verifier = self.display_name(handle.guild_id(), actor_id).await;
        fields.mark_verified(verifier);
        let rendering = codec::encode_handle(handle, &fields);
        self.collaborators
            .surface
            .update(
                handle.identity(),
                &rendering,
                &self.triggers.buttons(&[Trigger::Advance]),
            )
            .await?;

        info!("Submission verified");
        Ok(TransitionOutcome::Applied {
            trigger: Trigger::Approve,
            from,
            to: ReviewState::Verified,
            artifact: handle.identity().clone(),
            cache_degraded: degraded || !forgotten,
        })
    }

    async fn reject(
        &self,
        handle: &SessionHandle,
        mut fields: DomainFields,
        from: ReviewState,
        degraded: bool,
    ) -> TallyResult<TransitionOutcome> {
        self.store_call(
            "mark_rejected",
            self.collaborators.store.mark_rejected(handle.subject_id()),
        )
        .await?;

        fields.state = ReviewState::Rejected;
        let mut rendering = codec::encode_handle(handle, &fields);
        rendering.fields.extend(codec::instructions(handle.subject_id()));
        self.collaborators
            .surface
            .update(
                handle.identity(),
                &rendering,
                &self.triggers.buttons(&[Trigger::Advance, Trigger::Remove]),
            )
            .await?;

        let persisted = match self.index.persist(handle, &fields).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not cache rejected session");
                false
            }
        };
        info!("Submission rejected");
        Ok(TransitionOutcome::Applied {
            trigger: Trigger::Reject,
            from,
            to: ReviewState::Rejected,
            artifact: handle.identity().clone(),
            cache_degraded: degraded || !persisted,
        })
    }

    async fn remove(
        &self,
        handle: &SessionHandle,
        mut fields: DomainFields,
        from: ReviewState,
        degraded: bool,
    ) -> TallyResult<TransitionOutcome> {
        self.store_call(
            "delete_subject",
            self.collaborators.store.delete_subject(handle.subject_id()),
        )
        .await?;
        let forgotten = self.forget(handle).await;

        fields.state = ReviewState::Removed;
        let rendering = codec::encode_handle(handle, &fields);
        self.collaborators
            .surface
            .update(
                handle.identity(),
                &rendering,
                &self.triggers.buttons(&[Trigger::Advance]),
            )
            .await?;

        info!("Submission removed");
        Ok(TransitionOutcome::Applied {
            trigger: Trigger::Remove,
            from,
            to: ReviewState::Removed,
            artifact: handle.identity().clone(),
            cache_degraded: degraded || !forgotten,
        })
    }

    /// Bring a finished submission's artifact and cache in line with the store.
    ///
    /// A transition that failed half way (store written, re-render lost) leaves a cached
    /// session and a stale rendering behind. The store does not change here.
    async fn settle(
        &self,
        handle: &SessionHandle,
        mut fields: DomainFields,
        rendered: ReviewState,
    ) -> TallyResult<()> {
        self.forget(handle).await;
        if rendered == fields.state {
            return Ok(());
        }

        // The trigger may carry an older rendering than the platform shows.
        let Some(current) = self.collaborators.surface.fetch(handle.identity()).await? else {
            return Ok(());
        };
        let shown = codec::decode(handle.identity(), &current).map(|(_, shown)| shown.state);
        if shown.as_ref().ok() == Some(&fields.state) {
            return Ok(());
        }

        if fields.state == ReviewState::Verified && fields.verified_by.is_none() {
            fields.verified_by = Some(UNKNOWN_VERIFIER.to_string());
        }
        let rendering = codec::encode_handle(handle, &fields);
        self.collaborators
            .surface
            .update(
                handle.identity(),
                &rendering,
                &self.triggers.buttons(&[Trigger::Advance]),
            )
            .await?;
        info!(state = %fields.state, "Re-rendered stale artifact");
        Ok(())
    }

    async fn publish_next(
        &self,
        guild_id: &str,
        channel_id: &str,
        context_id: &str,
    ) -> TallyResult<TransitionOutcome> {
        let next = self
            .store_call(
                "pending_subject",
                self.collaborators.store.pending_subject(context_id),
            )
            .await?;

        let Some(subject) = next else {
            let artifact = self
                .collaborators
                .surface
                .publish(guild_id, channel_id, &RenderedState::notice(NOTHING_PENDING), &[])
                .await?;
            info!(context_id, "No pending submissions left");
            return Ok(TransitionOutcome::Exhausted {
                context_id: context_id.to_string(),
                artifact,
            });
        };

        let fields = self.fields_for(guild_id, &subject).await;
        let item = ReviewItem::new(SessionKind::Verification, &subject.id, context_id);
        let rendering = codec::encode(&item, &fields);
        let artifact = self
            .collaborators
            .surface
            .publish(
                guild_id,
                channel_id,
                &rendering,
                &self.triggers.buttons(&[Trigger::Approve, Trigger::Reject]),
            )
            .await?;

        let handle = SessionHandle::new(artifact.clone(), item);
        let persisted = match self.index.persist(&handle, &fields).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not cache published session");
                false
            }
        };
        info!(subject_id = %subject.id, artifact = %artifact, "Published next submission");
        Ok(TransitionOutcome::Published {
            artifact,
            subject_id: subject.id,
            cache_degraded: !persisted,
        })
    }

    async fn fields_for(&self, guild_id: &str, subject: &Subject) -> DomainFields {
        DomainFields {
            context_name: subject.context_name.clone(),
            display_name: self.display_name(guild_id, &subject.user_id).await,
            ign: subject.ign.clone(),
            score: subject.score,
            image_url: subject.proof_url.clone(),
            state: ReviewState::UnderReview,
            verified_by: None,
        }
    }

    /// Fail with `NotAuthorized` unless the actor holds the role configured for
    /// verification in the guild.
    #[instrument(skip(self))]
    pub async fn authorize(&self, guild_id: &str, actor_id: &str) -> TallyResult<()> {
        let Some(role_id) = self.permission(guild_id).await? else {
            return Ok(());
        };

        let directory = &self.collaborators.directory;
        if directory.has_role(guild_id, actor_id, &role_id).await? {
            return Ok(());
        }

        let role_name = match directory.role_name(guild_id, &role_id).await {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_ROLE.to_string(),
            Err(e) => {
                warn!(error = %e, role_id = %role_id, "Could not resolve role name");
                UNKNOWN_ROLE.to_string()
            }
        };
        info!(role = %role_name, "Actor is not authorized");
        Err(WorkflowError::new(WorkflowErrorKind::NotAuthorized {
            permission: role_name,
            action: VERIFICATION_ACTION_LABEL.to_string(),
        })
        .into())
    }

    async fn permission(&self, guild_id: &str) -> TallyResult<Option<String>> {
        let action = self.config.verification_action();
        let key = format!("{}:{}", guild_id, action);
        let store = &self.collaborators.store;
        with_deadline(
            "permission",
            self.cache_timeout + self.config.store_timeout(),
            self.meta.once(&key, self.config.permission_ttl(), || {
                self.store_call(
                    "permission_for_action",
                    store.permission_for_action(action, guild_id),
                )
            }),
        )
        .await
    }

    async fn display_name(&self, guild_id: &str, user_id: &str) -> String {
        match self
            .collaborators
            .directory
            .display_name(guild_id, user_id)
            .await
        {
            Ok(Some(name)) => name,
            Ok(None) => user_id.to_string(),
            Err(e) => {
                warn!(error = %e, user_id, "Could not resolve display name");
                user_id.to_string()
            }
        }
    }

    /// Drop the session from the cache, reporting whether that worked.
    async fn forget(&self, handle: &SessionHandle) -> bool {
        match self.index.invalidate(handle).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not invalidate session");
                false
            }
        }
    }

    async fn store_call<T, F>(&self, operation: &str, call: F) -> TallyResult<T>
    where
        F: Future<Output = TallyResult<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, "Store call timed out");
                Err(StoreError::new(StoreErrorKind::Timeout(operation.to_string())).into())
            }
        }
    }
}
