//! Trait definitions for the collaborators of the verification workflow.
//!
//! The workflow never talks to a database or a chat gateway directly. It is handed
//! implementations of these traits at startup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{MemberDirectory, RecordStore, RenderingSurface};
