//! Review states, rendered domain fields and store records.

use serde::{Deserialize, Serialize};

/// Where a submission is in its review.
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
pub enum ReviewState {
    /// Waiting in the store, not yet shown to a reviewer
    Pending,
    /// Rendered and awaiting a decision
    #[strum(serialize = "Under Review")]
    UnderReview,
    /// Turned down; awaiting a re-score or removal
    Rejected,
    /// Accepted
    Verified,
    /// Deleted from the store
    Removed,
}

impl ReviewState {
    /// No further business transition is expected from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Removed)
    }
}

/// Human-facing fields shown on a review artifact.
///
/// Valid values keep `verified_by` set exactly when `state` is `Verified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct DomainFields {
    /// Display name of the event
    pub context_name: String,
    /// Display name of the submitting member
    pub display_name: String,
    /// In-game name claimed by the submitter
    pub ign: String,
    /// Claimed score
    pub score: i64,
    /// Proof screenshot
    #[builder(default)]
    pub image_url: Option<String>,
    /// Review state at render time
    #[builder(default = "ReviewState::UnderReview")]
    pub state: ReviewState,
    /// Who verified the submission
    #[builder(default)]
    pub verified_by: Option<String>,
}

impl DomainFields {
    /// Start building a set of fields.
    pub fn builder() -> DomainFieldsBuilder {
        DomainFieldsBuilder::default()
    }

    /// Whether the rendering shows the submission as verified.
    pub fn verified(&self) -> bool {
        self.state == ReviewState::Verified
    }

    /// Whether the verification fields agree with each other.
    pub fn is_valid(&self) -> bool {
        self.verified() == self.verified_by.is_some()
    }

    /// Mark verified by the given reviewer.
    pub fn mark_verified(&mut self, by: impl Into<String>) {
        self.state = ReviewState::Verified;
        self.verified_by = Some(by.into());
    }

    /// Overwrite the business values with the store's copy of the subject.
    pub fn refresh_from(&mut self, subject: &Subject) {
        self.ign = subject.ign.clone();
        self.score = subject.score;
        self.image_url = subject.proof_url.clone();
    }
}

/// A score submission as the store of record holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct Subject {
    /// Submission id
    pub id: String,
    /// Event the submission belongs to
    pub context_id: String,
    /// Display name of the event
    pub context_name: String,
    /// Platform id of the submitter
    pub user_id: String,
    /// In-game name
    pub ign: String,
    /// Claimed score
    pub score: i64,
    /// Proof screenshot
    #[builder(default)]
    pub proof_url: Option<String>,
    /// Whether a reviewer accepted it
    #[builder(default)]
    pub verified: bool,
}

impl Subject {
    /// Start building a subject.
    pub fn builder() -> SubjectBuilder {
        SubjectBuilder::default()
    }
}
