//! Verification workflow error types.

/// Workflow-level failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum WorkflowErrorKind {
    /// The actor lacks the role configured for the action
    #[display("Actor lacks role '{}' required for {}", permission, action)]
    NotAuthorized {
        /// Human readable role name
        permission: String,
        /// Human readable action name
        action: String,
    },
    /// The subject already reached a terminal state
    #[display("Subject '{}' is already {}", subject_id, state)]
    AlreadyTerminal {
        /// Subject under review
        subject_id: String,
        /// Terminal state it is in
        state: String,
    },
    /// The trigger is not valid from the current state
    #[display("Cannot {} a submission that is {}", trigger, state)]
    InvalidTransition {
        /// Current state
        state: String,
        /// Requested trigger
        trigger: String,
    },
    /// Neither the cache nor the artifact could produce a session
    #[display("Session for '{}' could not be resolved", _0)]
    Unresolvable(String),
}

/// Workflow error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workflow Error: {} at line {} in {}", kind, line, file)]
pub struct WorkflowError {
    /// The kind of error that occurred
    pub kind: WorkflowErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl WorkflowError {
    /// Create a new workflow error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WorkflowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WorkflowErrorKind {
        &self.kind
    }
}
