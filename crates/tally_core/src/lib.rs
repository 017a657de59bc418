//! Core data types for the tally verification workspace.
//!
//! These types are shared by the cache-backed session index, the artifact codec and
//! the verification workflow. None of them perform I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod identity;
mod rendering;
mod review;
mod trigger;

pub use identity::{ArtifactIdentity, ReviewItem, SessionHandle, SessionKind};
pub use rendering::{ButtonStyle, RenderedField, RenderedState, TriggerButton};
pub use review::{DomainFields, DomainFieldsBuilder, ReviewState, Subject, SubjectBuilder};
pub use trigger::{Trigger, TriggerEvent};
