//! Outbound seam between the responder and a messaging platform.
//!
//! A platform (LINE, or the dry-run recorder used by tools and tests)
//! implements [`PlatformGateway`]; the responder only ever sees the trait.

pub mod error;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{DryRunGateway, PlatformGateway, SentReply},
};
