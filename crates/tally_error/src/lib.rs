//! Error types for the tally workspace.
//!
//! Every concern gets the same shape:
//! - a `*ErrorKind` enum naming the specific condition
//! - a `*Error` struct wrapping the kind with the source location (`#[track_caller]`)
//!
//! All of them convert into [`TallyError`], which also knows how to phrase itself for
//! the person who clicked the button ([`TallyError::user_message`]).
//!
//! # Examples
//!
//! ```
//! use tally_error::{StoreError, StoreErrorKind, TallyResult};
//!
//! fn load() -> TallyResult<String> {
//!     Err(StoreError::new(StoreErrorKind::Unavailable("connection refused".into())))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod codec;
mod config;
mod error;
mod store;
mod surface;
mod workflow;

pub use cache::{CacheError, CacheErrorKind};
pub use codec::{CodecError, CodecErrorKind};
pub use config::ConfigError;
pub use error::{TallyError, TallyErrorKind, TallyResult};
pub use store::{StoreError, StoreErrorKind};
pub use surface::{SurfaceError, SurfaceErrorKind};
pub use workflow::{WorkflowError, WorkflowErrorKind};
