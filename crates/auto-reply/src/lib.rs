//! Inbound event processing: the glue between the platform and the reply
//! table.
//!
//! Flow: inbound event → classify text / parse postback → resolve a table
//! entry → assemble its message slots → deliver via the platform gateway.

pub mod error;
pub mod reply;
pub mod resolve;

pub use {
    error::{Error, Result},
    reply::{ReplyOutcome, Rendered, Responder, SilentReason},
    resolve::{IntentResolver, MissReason, PostbackQuery, Resolution},
};
