//! LINE Messaging API channel for roster.
//!
//! Decodes webhook bodies into [`InboundEvent`](roster_common::InboundEvent)s
//! and delivers replies through the reply endpoint with a channel access
//! token. Signature verification happens before a body reaches this crate.

pub mod event;
pub mod outbound;

pub use {
    event::{WebhookBody, WebhookEvent, decode_webhook},
    outbound::LineGateway,
};
