//! Inbound triggers.

use crate::{ArtifactIdentity, RenderedState};
use serde::{Deserialize, Serialize};

/// Business meaning of a trigger.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Trigger {
    /// Accept the submission
    Approve,
    /// Turn the submission down
    Reject,
    /// Move on to the next pending submission
    Advance,
    /// Delete a rejected submission
    Remove,
}

impl Trigger {
    /// Navigation triggers do not mutate the subject and stay valid after it is terminal.
    pub fn is_navigation(self) -> bool {
        matches!(self, Self::Advance)
    }
}

/// A reaction or button click delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Artifact the trigger fired on
    pub identity: ArtifactIdentity,
    /// Member who fired it
    pub actor_id: String,
    /// Button id or reaction emoji
    pub trigger_name: String,
    /// Current rendering, when the platform sends it along (button clicks do)
    pub rendering: Option<RenderedState>,
}

impl TriggerEvent {
    /// Create an event without a rendering attached.
    pub fn new(
        identity: ArtifactIdentity,
        actor_id: impl Into<String>,
        trigger_name: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            actor_id: actor_id.into(),
            trigger_name: trigger_name.into(),
            rendering: None,
        }
    }

    /// Attach the artifact's current rendering.
    pub fn with_rendering(mut self, rendering: RenderedState) -> Self {
        self.rendering = Some(rendering);
        self
    }
}
