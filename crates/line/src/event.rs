use {
    roster_channels::Result,
    roster_common::InboundEvent,
    serde::Deserialize,
    tracing::debug,
};

/// Webhook request body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    /// Bot user ID the events were sent to.
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    /// `active` or `standby`; standby channels must not reply.
    pub mode: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
    pub postback: Option<Postback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub data: String,
}

impl WebhookEvent {
    pub fn user_id(&self) -> Option<String> {
        self.source.as_ref().and_then(|s| s.user_id.clone())
    }

    fn is_standby(&self) -> bool {
        self.mode.as_deref() == Some("standby")
    }

    /// The event as the responder sees it, or `None` for events it does not
    /// answer (follows, stickers, images, standby mode, ...).
    pub fn to_inbound(&self) -> Option<InboundEvent> {
        if self.is_standby() {
            debug!(event_type = %self.event_type, "ignoring standby event");
            return None;
        }
        let Some(reply_token) = self.reply_token.clone() else {
            debug!(event_type = %self.event_type, "ignoring event without reply token");
            return None;
        };
        let user_id = self.user_id();

        match self.event_type.as_str() {
            "message" => {
                let message = self.message.as_ref()?;
                if message.message_type != "text" {
                    debug!(message_type = %message.message_type, "ignoring non-text message");
                    return None;
                }
                let Some(text) = message.text.clone() else {
                    debug!(message_id = ?message.id, "ignoring text message without text");
                    return None;
                };
                Some(InboundEvent::Text {
                    reply_token,
                    text,
                    user_id,
                })
            },
            "postback" => {
                let postback = self.postback.as_ref()?;
                Some(InboundEvent::Postback {
                    reply_token,
                    data: postback.data.clone(),
                    user_id,
                })
            },
            other => {
                debug!(event_type = other, "ignoring unsupported event");
                None
            },
        }
    }
}

/// Parse a (verified) webhook body into the events the responder handles,
/// in delivery order.
pub fn decode_webhook(body: &str) -> Result<Vec<InboundEvent>> {
    let body: WebhookBody = serde_json::from_str(body)?;
    debug!(
        destination = body.destination.as_deref().unwrap_or(""),
        events = body.events.len(),
        "decoded webhook body"
    );
    Ok(body
        .events
        .iter()
        .filter_map(WebhookEvent::to_inbound)
        .collect())
}
