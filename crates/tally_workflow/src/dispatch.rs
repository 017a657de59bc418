//! The inbound entry point for reactions and button clicks.

use crate::{TransitionOutcome, VerificationWorkflow};
use std::sync::Arc;
use tally_core::{ArtifactIdentity, TriggerEvent};
use tally_error::{TallyError, TallyResult, WorkflowErrorKind};
use tally_session::{ResolvedSession, kind_for_marker};
use tracing::{debug, error, info, instrument, warn};

/// Why a trigger was dropped without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum IgnoreReason {
    /// The bot's own reaction or click
    OwnAction,
    /// Not a name in the trigger table
    UnknownTrigger,
    /// The artifact is not a review session
    NotReviewable,
    /// The artifact no longer exists
    ArtifactGone,
}

/// Result of handling one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing to do
    Ignored(IgnoreReason),
    /// The actor was told they lack the required role
    Denied {
        /// Role they would need
        permission: String,
    },
    /// The workflow ran
    Transitioned(TransitionOutcome),
}

/// Routes triggers from the platform into the workflow.
///
/// # Examples
///
/// ```no_run
/// # async fn run(dispatcher: tally_workflow::TriggerDispatcher) -> tally_error::TallyResult<()> {
/// use tally_core::{ArtifactIdentity, TriggerEvent};
///
/// let event = TriggerEvent::new(ArtifactIdentity::new("1", "2", "3"), "99", "score-verify-btn");
/// let outcome = dispatcher.handle_trigger(event).await?;
/// println!("{:?}", outcome);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TriggerDispatcher {
    workflow: Arc<VerificationWorkflow>,
}

impl TriggerDispatcher {
    /// Dispatch into `workflow`.
    pub fn new(workflow: Arc<VerificationWorkflow>) -> Self {
        Self { workflow }
    }

    /// The workflow triggers are dispatched into.
    pub fn workflow(&self) -> &Arc<VerificationWorkflow> {
        &self.workflow
    }

    /// Handle a reaction or button click.
    ///
    /// Errors are reported to the actor through the surface before being returned, so
    /// callers only need to log them. A missing role is reported and returned as
    /// [`TriggerOutcome::Denied`].
    #[instrument(
        skip(self, event),
        fields(
            correlation_key = %event.identity.correlation_key(),
            actor_id = %event.actor_id,
            trigger_name = %event.trigger_name,
        )
    )]
    pub async fn handle_trigger(&self, event: TriggerEvent) -> TallyResult<TriggerOutcome> {
        if self.workflow.config().bot_user_id().as_deref() == Some(event.actor_id.as_str()) {
            return Ok(TriggerOutcome::Ignored(IgnoreReason::OwnAction));
        }
        let Some(trigger) = self.workflow.triggers().lookup(&event.trigger_name) else {
            debug!("Not a workflow trigger");
            return Ok(TriggerOutcome::Ignored(IgnoreReason::UnknownTrigger));
        };

        let session = match self.resolve(&event).await {
            Ok(Ok(session)) => session,
            Ok(Err(reason)) => {
                debug!(%reason, "Ignoring trigger");
                return Ok(TriggerOutcome::Ignored(reason));
            }
            Err(e) => return Err(self.report(&event.identity, e).await),
        };

        match self.workflow.apply(&event.actor_id, trigger, session).await {
            Ok(outcome) => Ok(TriggerOutcome::Transitioned(outcome)),
            Err(e) => match e.workflow_kind() {
                Some(WorkflowErrorKind::NotAuthorized { permission, .. }) => {
                    let permission = permission.clone();
                    self.notify(&event.identity, &e.user_message()).await;
                    Ok(TriggerOutcome::Denied { permission })
                }
                _ => Err(self.report(&event.identity, e).await),
            },
        }
    }

    /// Find the session behind the event's artifact: cache first, then the rendering
    /// carried by the event, then the rendering fetched from the platform.
    async fn resolve(
        &self,
        event: &TriggerEvent,
    ) -> TallyResult<Result<ResolvedSession, IgnoreReason>> {
        let index = self.workflow.index();
        if let Some(session) = index.resolve(&event.identity).await {
            return Ok(Ok(session));
        }

        let rendering = match &event.rendering {
            Some(rendering) => rendering.clone(),
            None => match self.workflow.surface().fetch(&event.identity).await? {
                Some(rendering) => rendering,
                None => return Ok(Err(IgnoreReason::ArtifactGone)),
            },
        };
        if kind_for_marker(&rendering.description).is_none() {
            return Ok(Err(IgnoreReason::NotReviewable));
        }

        info!("Recovering session from artifact");
        let session = index.recover(&event.identity, &rendering).await?;
        Ok(Ok(session))
    }

    async fn report(&self, identity: &ArtifactIdentity, e: TallyError) -> TallyError {
        match e.workflow_kind() {
            Some(WorkflowErrorKind::InvalidTransition { .. }) => {
                info!(error = %e, "Trigger not valid here")
            }
            _ => error!(error = %e, "Trigger failed"),
        }
        self.notify(identity, &e.user_message()).await;
        e
    }

    async fn notify(&self, identity: &ArtifactIdentity, message: &str) {
        if let Err(e) = self.workflow.surface().notify(identity, message).await {
            warn!(error = %e, "Could not notify actor");
        }
    }
}
