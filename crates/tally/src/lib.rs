//! Submission verification core for community-event bots.
//!
//! This crate ties the workspace together:
//! - [`TallyConfig`] loads layered configuration
//! - [`init_observability`] sets up logging (and OpenTelemetry with the
//!   `observability` feature)
//! - [`assemble`] picks the cache backend and builds a ready
//!   [`TriggerDispatcher`](tally_workflow::TriggerDispatcher)
//!
//! The bot supplies the store, the chat surface and the member directory; see
//! [`tally_interface`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembly;
mod config;
mod observability;

pub use assembly::{assemble, cache_backend};
pub use config::TallyConfig;
pub use observability::{ObservabilityConfig, init_observability, shutdown_observability};

pub use tally_cache::{CacheConfig, KeyedCache, KeyedCacheExt, MemoryCache, NamedCache};
pub use tally_core::{
    ArtifactIdentity, DomainFields, RenderedField, RenderedState, ReviewState, SessionHandle,
    SessionKind, Subject, Trigger, TriggerButton, TriggerEvent,
};
pub use tally_error::{TallyError, TallyErrorKind, TallyResult};
pub use tally_interface::{MemberDirectory, RecordStore, RenderingSurface};
pub use tally_workflow::{
    Collaborators, IgnoreReason, TransitionOutcome, TriggerConfig, TriggerDispatcher,
    TriggerOutcome, VerificationWorkflow, WorkflowConfig,
};
