use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde::Serialize,
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use roster_metrics::{counter, labels, line as line_metrics};

use {
    roster_channels::{Error, PlatformGateway, Result},
    roster_common::MessagePayload,
    roster_config::LineConfig,
};

/// The reply endpoint accepts at most this many messages per call.
pub const MAX_REPLY_MESSAGES: usize = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [MessagePayload],
}

/// Sends replies through the LINE Messaging API.
pub struct LineGateway {
    http: reqwest::Client,
    config: LineConfig,
}

impl LineGateway {
    pub fn new(config: LineConfig) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: LineConfig) -> Result<Self> {
        if !config.has_token() {
            return Err(Error::not_configured("LINE channel access token"));
        }
        Ok(Self { http, config })
    }

    fn reply_url(&self) -> String {
        format!(
            "{}/v2/bot/message/reply",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PlatformGateway for LineGateway {
    fn id(&self) -> &str {
        "line"
    }

    async fn reply(&self, reply_token: &str, messages: &[MessagePayload]) -> Result<()> {
        if messages.is_empty() {
            return Err(Error::invalid_reply("reply needs at least one message"));
        }
        if messages.len() > MAX_REPLY_MESSAGES {
            return Err(Error::invalid_reply(format!(
                "reply has {} messages, LINE accepts at most {MAX_REPLY_MESSAGES}",
                messages.len()
            )));
        }

        let request = ReplyRequest {
            reply_token,
            messages,
        };
        debug!(reply_token, count = messages.len(), "sending LINE reply");
        let resp = self
            .http
            .post(self.reply_url())
            .bearer_auth(self.config.channel_access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                #[cfg(feature = "metrics")]
                counter!(line_metrics::REPLY_REQUESTS_TOTAL, labels::STATUS => "error").increment(1);
                Error::external("LINE reply request", e)
            })?;

        #[cfg(feature = "metrics")]
        counter!(line_metrics::REPLY_REQUESTS_TOTAL, labels::STATUS => resp.status().as_u16().to_string())
            .increment(1);

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport { status, body });
        }

        info!(reply_token, count = messages.len(), "LINE reply sent");
        Ok(())
    }
}
