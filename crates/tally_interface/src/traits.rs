//! Collaborator traits.

use async_trait::async_trait;
use tally_core::{ArtifactIdentity, RenderedState, Subject, TriggerButton};
use tally_error::TallyResult;

/// The relational store of record for submissions and permissions.
///
/// Failures should surface as `StoreError`s so the workflow can tell the actor to retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Oldest submission of an event that is neither verified nor rejected, if any.
    async fn pending_subject(&self, context_id: &str) -> TallyResult<Option<Subject>>;

    /// Look up a submission by id. `None` once it has been deleted.
    async fn subject(&self, subject_id: &str) -> TallyResult<Option<Subject>>;

    /// Flag a submission as verified.
    async fn mark_verified(&self, subject_id: &str) -> TallyResult<()>;

    /// Flag a submission as rejected, taking it out of the pending queue.
    ///
    /// Stores should put it back in the queue once its score changes.
    async fn mark_rejected(&self, subject_id: &str) -> TallyResult<()>;

    /// Delete a submission.
    async fn delete_subject(&self, subject_id: &str) -> TallyResult<()>;

    /// Role id required for an action in a guild.
    ///
    /// `None` means nobody configured a role and the action is unrestricted.
    async fn permission_for_action(
        &self,
        action: &str,
        guild_id: &str,
    ) -> TallyResult<Option<String>>;
}

/// The chat platform, seen as a place where renderings live.
#[async_trait]
pub trait RenderingSurface: Send + Sync {
    /// Post a new artifact and return its identity.
    async fn publish(
        &self,
        guild_id: &str,
        channel_id: &str,
        rendering: &RenderedState,
        buttons: &[TriggerButton],
    ) -> TallyResult<ArtifactIdentity>;

    /// Replace the rendering and triggers of an existing artifact.
    async fn update(
        &self,
        identity: &ArtifactIdentity,
        rendering: &RenderedState,
        buttons: &[TriggerButton],
    ) -> TallyResult<()>;

    /// Current rendering of an artifact. `None` if it no longer exists.
    async fn fetch(&self, identity: &ArtifactIdentity) -> TallyResult<Option<RenderedState>>;

    /// Send a short message to whoever triggered something on the artifact.
    async fn notify(&self, identity: &ArtifactIdentity, message: &str) -> TallyResult<()>;
}

/// Guild membership and role lookups.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Whether a member holds a role.
    async fn has_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> TallyResult<bool>;

    /// Human readable name of a role.
    async fn role_name(&self, guild_id: &str, role_id: &str) -> TallyResult<Option<String>>;

    /// Display name of a member, used for the audit trail on verified renderings.
    async fn display_name(&self, guild_id: &str, user_id: &str) -> TallyResult<Option<String>>;
}
