use std::sync::Mutex;

use {
    async_trait::async_trait,
    roster_common::MessagePayload,
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// Delivers replies to a messaging platform.
///
/// Transport failures are returned to the caller unchanged; gateways do
/// not retry.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Platform identifier (e.g. "line").
    fn id(&self) -> &str;

    /// Answer the event identified by `reply_token` with `messages`, in
    /// order.
    async fn reply(&self, reply_token: &str, messages: &[MessagePayload]) -> Result<()>;
}

/// A reply captured by [`DryRunGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub reply_token: String,
    pub messages: Vec<MessagePayload>,
}

/// Gateway that records replies instead of sending them.
#[derive(Default)]
pub struct DryRunGateway {
    sent: Mutex<Vec<SentReply>>,
    fail_status: Option<u16>,
}

impl DryRunGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose every reply fails with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            sent: Mutex::default(),
            fail_status: Some(status),
        }
    }

    /// Replies recorded so far.
    pub fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PlatformGateway for DryRunGateway {
    fn id(&self) -> &str {
        "dry-run"
    }

    async fn reply(&self, reply_token: &str, messages: &[MessagePayload]) -> Result<()> {
        if let Some(status) = self.fail_status {
            debug!(reply_token, status, "dry-run reply rejected");
            return Err(Error::Transport {
                status,
                body: "dry-run gateway configured to fail".into(),
            });
        }
        if messages.is_empty() {
            return Err(Error::invalid_reply("reply needs at least one message"));
        }

        info!(reply_token, count = messages.len(), "dry-run reply");
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(SentReply {
            reply_token: reply_token.to_string(),
            messages: messages.to_vec(),
        });
        Ok(())
    }
}
