//! Artifact codec error types.

/// Reasons a rendered artifact could not be turned back into a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CodecErrorKind {
    /// The rendering is not a reviewable item, or a field holds garbage
    #[display("Malformed artifact: {}", _0)]
    MalformedArtifact(String),
    /// A required named field is absent
    #[display("Missing field: {}", _0)]
    MissingField(String),
}

/// Codec error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Codec Error: {} at line {} in {}", kind, line, file)]
pub struct CodecError {
    /// The kind of error that occurred
    pub kind: CodecErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CodecError {
    /// Create a new codec error with automatic location tracking.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_error::{CodecError, CodecErrorKind};
    ///
    /// let err = CodecError::new(CodecErrorKind::MissingField("IGN".to_string()));
    /// assert!(format!("{}", err).contains("IGN"));
    /// ```
    #[track_caller]
    pub fn new(kind: CodecErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
