//! Artifact identities and the session handles correlated with them.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

const KEY_SEPARATOR: char = '|';

/// Identity of a rendered artifact on the chat platform.
///
/// # Examples
///
/// ```
/// use tally_core::ArtifactIdentity;
///
/// let id = ArtifactIdentity::new("100", "200", "300");
/// assert_eq!(id.correlation_key(), "100|200|300");
/// assert_eq!(ArtifactIdentity::parse_correlation_key("100|200|300"), Some(id));
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, derive_more::Display,
)]
#[display("{}/{}/{}", guild_id, channel_id, message_id)]
pub struct ArtifactIdentity {
    guild_id: String,
    channel_id: String,
    message_id: String,
}

impl ArtifactIdentity {
    /// Create an identity from its three platform ids.
    pub fn new(
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    /// Deterministic cache key for this artifact.
    pub fn correlation_key(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.guild_id,
            self.channel_id,
            self.message_id,
            sep = KEY_SEPARATOR
        )
    }

    /// Rebuild an identity from a correlation key.
    ///
    /// Returns `None` unless the key has exactly three segments.
    pub fn parse_correlation_key(key: &str) -> Option<Self> {
        let mut parts = key.split(KEY_SEPARATOR);
        let guild_id = parts.next()?;
        let channel_id = parts.next()?;
        let message_id = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(guild_id, channel_id, message_id))
    }
}

/// What kind of dialog a session drives.
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
pub enum SessionKind {
    /// Moderator review of a score submission
    Verification,
    /// Participant-facing submission receipt
    Submission,
    /// Event administration dialog
    EventManagement,
}

/// The business item a session is about, known before its artifact exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct ReviewItem {
    kind: SessionKind,
    subject_id: String,
    context_id: String,
}

impl ReviewItem {
    /// Create a review item.
    pub fn new(
        kind: SessionKind,
        subject_id: impl Into<String>,
        context_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
            context_id: context_id.into(),
        }
    }
}

/// Internal handle correlating a rendered artifact with the item it shows.
///
/// The correlation key is always derived from the identity, so anyone holding the
/// artifact can find the handle again without a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SessionHandle {
    identity: ArtifactIdentity,
    item: ReviewItem,
    correlation_key: String,
}

impl SessionHandle {
    /// Bind a review item to the artifact that renders it.
    pub fn new(identity: ArtifactIdentity, item: ReviewItem) -> Self {
        let correlation_key = identity.correlation_key();
        Self {
            identity,
            item,
            correlation_key,
        }
    }

    /// Session kind.
    pub fn kind(&self) -> SessionKind {
        self.item.kind
    }

    /// Subject under review.
    pub fn subject_id(&self) -> &str {
        &self.item.subject_id
    }

    /// Context (event) the subject belongs to.
    pub fn context_id(&self) -> &str {
        &self.item.context_id
    }

    /// Guild the artifact lives in.
    pub fn guild_id(&self) -> &str {
        &self.identity.guild_id
    }

    /// Whether the stored key still matches the identity.
    ///
    /// Only false for handles deserialized from a tampered or foreign payload.
    pub fn is_consistent(&self) -> bool {
        self.correlation_key == self.identity.correlation_key()
    }
}
