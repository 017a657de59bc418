//! The verification transition table.

use tally_core::{ReviewState, Subject, Trigger};
use tally_error::{WorkflowError, WorkflowErrorKind};

/// What a trigger does from a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move the current submission to a new state
    To(ReviewState),
    /// Leave the current submission and publish the next pending one
    PublishNext,
    /// The submission is already finished; do nothing
    AlreadyTerminal,
}

/// Look up `trigger` in the transition table.
///
/// | from | trigger | step |
/// |---|---|---|
/// | Pending, Under Review | Approve | to Verified |
/// | Under Review | Reject | to Rejected |
/// | Rejected | Remove | to Removed |
/// | Verified, Rejected, Removed | Advance | publish next |
/// | Verified, Removed | Approve, Reject, Remove | already terminal |
///
/// # Errors
///
/// `InvalidTransition` for every other combination.
pub fn step(from: ReviewState, trigger: Trigger) -> Result<Step, WorkflowError> {
    use ReviewState::*;
    use Trigger::*;

    match (from, trigger) {
        (Pending | UnderReview, Approve) => Ok(Step::To(Verified)),
        (UnderReview, Reject) => Ok(Step::To(Rejected)),
        (Rejected, Remove) => Ok(Step::To(Removed)),
        (Verified | Rejected | Removed, Advance) => Ok(Step::PublishNext),
        (state, trigger) if state.is_terminal() && !trigger.is_navigation() => {
            Ok(Step::AlreadyTerminal)
        }
        (state, trigger) => Err(WorkflowError::new(WorkflowErrorKind::InvalidTransition {
            state: state.to_string(),
            trigger: trigger.to_string(),
        })),
    }
}

/// State of a submission once the store's copy is taken into account.
///
/// The rendering may be stale: someone else may have verified or deleted the
/// submission, or the submitter may have fixed a rejected score.
pub fn reconcile(rendered: ReviewState, rendered_score: i64, stored: Option<&Subject>) -> ReviewState {
    match stored {
        None => ReviewState::Removed,
        Some(subject) if subject.verified => ReviewState::Verified,
        Some(subject) if rendered == ReviewState::Rejected && subject.score != rendered_score => {
            ReviewState::UnderReview
        }
        Some(_) => rendered,
    }
}
