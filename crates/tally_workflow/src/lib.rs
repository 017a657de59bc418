//! Submission verification workflow.
//!
//! A moderator reviews score submissions one at a time. Each submission is rendered as
//! a chat message carrying trigger buttons; clicks and reactions on that message come
//! back through [`TriggerDispatcher::handle_trigger`], which finds the session behind
//! the message and runs the transition in [`VerificationWorkflow`].
//!
//! The allowed transitions live in one table, see [`step`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatch;
mod state;
mod triggers;
mod workflow;

pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use dispatch::{IgnoreReason, TriggerDispatcher, TriggerOutcome};
pub use state::{Step, reconcile, step};
pub use triggers::{TriggerBinding, TriggerConfig, TriggerTable};
pub use workflow::{
    Collaborators, META_NAMESPACE, NOTHING_PENDING, TransitionOutcome, VerificationWorkflow,
};
