//! Chat platform (rendering surface and member directory) error types.

/// Kinds of chat platform failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SurfaceErrorKind {
    /// Posting a new artifact failed
    #[display("Failed to publish artifact: {}", _0)]
    Publish(String),
    /// Editing an existing artifact failed
    #[display("Failed to update artifact '{}': {}", artifact, reason)]
    Update {
        /// Correlation key of the artifact
        artifact: String,
        /// Platform message
        reason: String,
    },
    /// Reading an artifact back failed
    #[display("Failed to fetch artifact '{}': {}", artifact, reason)]
    Fetch {
        /// Correlation key of the artifact
        artifact: String,
        /// Platform message
        reason: String,
    },
    /// Replying to the actor failed
    #[display("Failed to notify: {}", _0)]
    Notify(String),
    /// Member or role lookup failed
    #[display("Directory lookup failed: {}", _0)]
    Directory(String),
}

/// Surface error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Surface Error: {} at line {} in {}", kind, line, file)]
pub struct SurfaceError {
    /// The kind of error that occurred
    pub kind: SurfaceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SurfaceError {
    /// Create a new surface error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SurfaceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
