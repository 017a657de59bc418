//! Session correlation for rendered review artifacts.
//!
//! A chat message is the durable copy of a review session. [`SessionIndex`] keeps a
//! fast cached copy keyed by the message's identity and falls back to decoding the
//! message itself (see [`codec`]) when the cache has forgotten it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod index;

pub use codec::{CodecResult, decode, encode, encode_handle, instructions, kind_for_marker, marker};
pub use index::{ResolvedSession, SessionEntry, SessionIndex, SessionSource};
