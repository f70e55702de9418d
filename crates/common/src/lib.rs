//! Types shared across roster crates: outbound message payloads and the
//! inbound events the responder answers.

pub mod types;

pub use types::{InboundEvent, MessageKind, MessagePayload};
