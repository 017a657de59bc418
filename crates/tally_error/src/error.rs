//! Top-level error wrapper types.

use crate::{
    CacheError, CodecError, ConfigError, StoreError, SurfaceError, WorkflowError,
    WorkflowErrorKind,
};

const RETRY_LATER: &str =
    "Something went wrong, please try again later or contact bot maintainer for help!";

/// Every error the tally crates can produce.
///
/// # Examples
///
/// ```
/// use tally_error::{TallyError, StoreError, StoreErrorKind};
///
/// let err: TallyError = StoreError::new(StoreErrorKind::Timeout("subject".into())).into();
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TallyErrorKind {
    /// Cache error
    #[from(CacheError)]
    Cache(CacheError),
    /// Artifact decode error
    #[from(CodecError)]
    Codec(CodecError),
    /// Store of record error
    #[from(StoreError)]
    Store(StoreError),
    /// Chat platform error
    #[from(SurfaceError)]
    Surface(SurfaceError),
    /// Workflow error
    #[from(WorkflowError)]
    Workflow(WorkflowError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Tally error with kind discrimination.
///
/// Cloneable so that callers coalesced onto one computation can all receive the
/// same failure.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Tally Error: {}", _0)]
pub struct TallyError(Box<TallyErrorKind>);

impl TallyError {
    /// Create a new error from a kind.
    pub fn new(kind: TallyErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TallyErrorKind {
        &self.0
    }

    /// The workflow error kind, if this is one.
    pub fn workflow_kind(&self) -> Option<&WorkflowErrorKind> {
        match self.kind() {
            TallyErrorKind::Workflow(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Text suitable for replying to the actor who caused the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_error::{TallyError, WorkflowError, WorkflowErrorKind};
    ///
    /// let err: TallyError = WorkflowError::new(WorkflowErrorKind::NotAuthorized {
    ///     permission: "Moderator".into(),
    ///     action: "submission verification".into(),
    /// })
    /// .into();
    /// assert_eq!(
    ///     err.user_message(),
    ///     "Sorry, only users with the role 'Moderator' can perform the submission verification action"
    /// );
    /// ```
    pub fn user_message(&self) -> String {
        match self.kind() {
            TallyErrorKind::Codec(_) => {
                "Could not parse the state of this submission, please retry.".to_string()
            }
            TallyErrorKind::Workflow(e) => match e.kind() {
                WorkflowErrorKind::NotAuthorized { permission, action } => format!(
                    "Sorry, only users with the role '{}' can perform the {} action",
                    permission, action
                ),
                WorkflowErrorKind::AlreadyTerminal { subject_id, state } => {
                    format!("Submission '{}' is already {}", subject_id, state)
                }
                WorkflowErrorKind::InvalidTransition { state, trigger } => format!(
                    "You can't {} a submission that is {}",
                    trigger.to_lowercase(),
                    state.to_lowercase()
                ),
                WorkflowErrorKind::Unresolvable(_) => {
                    "Could not find the submission behind this message, please retry.".to_string()
                }
            },
            TallyErrorKind::Cache(_)
            | TallyErrorKind::Store(_)
            | TallyErrorKind::Surface(_)
            | TallyErrorKind::Config(_) => RETRY_LATER.to_string(),
        }
    }
}

// Generic From implementation for any type that converts to TallyErrorKind
impl<T> From<T> for TallyError
where
    T: Into<TallyErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for tally operations.
pub type TallyResult<T> = std::result::Result<T, TallyError>;
