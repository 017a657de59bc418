//! Cache error types.

/// Kinds of cache errors.
///
/// A miss is never an error; lookups report it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CacheErrorKind {
    /// The backing store rejected or failed an operation
    #[display("Cache backend error: {}", _0)]
    Backend(String),
    /// A stored payload could not be decoded into the requested type
    #[display("Failed to decode cached value for '{}': {}", key, reason)]
    Decode {
        /// Key holding the malformed payload
        key: String,
        /// Decoder message
        reason: String,
    },
    /// A value could not be serialized for storage
    #[display("Failed to encode value for '{}': {}", key, reason)]
    Encode {
        /// Key being written
        key: String,
        /// Encoder message
        reason: String,
    },
    /// The operation did not finish within its deadline
    #[display("Cache operation '{}' timed out", _0)]
    Timeout(String),
}

/// Cache error with location tracking.
///
/// # Examples
///
/// ```
/// use tally_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::Timeout("get".to_string()));
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred
    pub kind: CacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CacheError {
    /// Create a new cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
