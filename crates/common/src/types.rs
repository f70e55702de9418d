//! Message payloads sent back to the chat platform and the inbound events
//! the responder consumes.

use std::fmt;

use {
    serde::{Deserialize, Deserializer, Serialize},
    serde_json::{Map, Value},
};

// ── Message kinds ───────────────────────────────────────────────────────────

/// Discriminant of a [`MessagePayload`], as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Imagemap,
    Template,
    Sticker,
    Audio,
    Location,
    Flex,
    Video,
}

impl MessageKind {
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::Image,
        Self::Imagemap,
        Self::Template,
        Self::Sticker,
        Self::Audio,
        Self::Location,
        Self::Flex,
        Self::Video,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Imagemap => "imagemap",
            Self::Template => "template",
            Self::Sticker => "sticker",
            Self::Audio => "audio",
            Self::Location => "location",
            Self::Flex => "flex",
            Self::Video => "video",
        }
    }

    /// Look up a kind by its wire discriminant. Unknown strings yield `None`.
    pub fn from_discriminant(discriminant: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == discriminant)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payloads ────────────────────────────────────────────────────────────────

/// One outbound message object.
///
/// Each variant carries the fields the platform requires for that kind;
/// any other keys present in the stored JSON (`quickReply`, `sender`,
/// `emojis`, ...) are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text(TextMessage),
    Image(MediaMessage),
    Imagemap(ImagemapMessage),
    Template(TemplateMessage),
    Sticker(StickerMessage),
    Audio(AudioMessage),
    Location(LocationMessage),
    Flex(FlexMessage),
    Video(MediaMessage),
}

impl MessagePayload {
    /// Plain text message with no extra fields.
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(TextMessage {
            text: body.into(),
            extra: Map::new(),
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Image(_) => MessageKind::Image,
            Self::Imagemap(_) => MessageKind::Imagemap,
            Self::Template(_) => MessageKind::Template,
            Self::Sticker(_) => MessageKind::Sticker,
            Self::Audio(_) => MessageKind::Audio,
            Self::Location(_) => MessageKind::Location,
            Self::Flex(_) => MessageKind::Flex,
            Self::Video(_) => MessageKind::Video,
        }
    }

    /// Text body for text messages, alt text for rich ones.
    pub fn preview(&self) -> Option<&str> {
        match self {
            Self::Text(m) => Some(&m.text),
            Self::Imagemap(m) => Some(&m.alt_text),
            Self::Template(m) => Some(&m.alt_text),
            Self::Flex(m) => Some(&m.alt_text),
            Self::Location(m) => Some(&m.title),
            Self::Image(_) | Self::Video(_) | Self::Sticker(_) | Self::Audio(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shared shape of image and video messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    pub original_content_url: String,
    pub preview_image_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagemapMessage {
    pub base_url: String,
    pub alt_text: String,
    pub base_size: Value,
    pub actions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMessage {
    pub alt_text: String,
    pub template: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub package_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub sticker_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMessage {
    pub original_content_url: String,
    /// Length in milliseconds.
    #[serde(deserialize_with = "whole_milliseconds")]
    pub duration: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexMessage {
    pub alt_text: String,
    pub contents: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sticker IDs are strings on the wire but spreadsheets tend to store them
/// as numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Spreadsheet cells hold numbers as floats, so `60000.0` has to decode as
/// `60000`. Fractions and negatives are rejected.
fn whole_milliseconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let n = serde_json::Number::deserialize(deserializer)?;
    if let Some(ms) = n.as_u64() {
        return Ok(ms);
    }
    match n.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!(
            "expected a whole number of milliseconds, got {n}"
        ))),
    }
}

// ── Inbound events ──────────────────────────────────────────────────────────

/// An inbound event the responder knows how to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free-text chat message.
    Text {
        reply_token: String,
        text: String,
        user_id: Option<String>,
    },
    /// Structured postback; `data` is a URL-encoded query string.
    Postback {
        reply_token: String,
        data: String,
        user_id: Option<String>,
    },
}

impl InboundEvent {
    pub fn reply_token(&self) -> &str {
        match self {
            Self::Text { reply_token, .. } | Self::Postback { reply_token, .. } => reply_token,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Text { user_id, .. } | Self::Postback { user_id, .. } => user_id.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Postback { .. } => "postback",
        }
    }
}
