//! Turn an entry's stored slots into outbound payloads.

use {
    roster_common::{MessageKind, MessagePayload},
    serde_json::Value,
    thiserror::Error,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use roster_metrics::{content as content_metrics, counter, labels};

use crate::entry::{ReplyEntry, SLOT_COUNT};

/// A populated slot that could not be decoded. The slot is dropped; the
/// rest of the reply is still sent.
#[derive(Debug, Error)]
pub enum MalformedPayload {
    #[error("not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("invalid {kind} message: {source}")]
    Fields {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of decoding one populated slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Payload(MessagePayload),
    /// `type` is absent or names no known kind; carries the raw value.
    UnknownKind(Option<String>),
}

/// Decode one serialized payload, dispatching on its `type` field.
pub fn decode_payload(raw: &str) -> Result<Decoded, MalformedPayload> {
    let value: Value = serde_json::from_str(raw).map_err(MalformedPayload::Json)?;
    let Value::Object(object) = &value else {
        return Err(MalformedPayload::NotAnObject);
    };

    let discriminant = object.get("type").and_then(Value::as_str);
    let Some(kind) = discriminant.and_then(MessageKind::from_discriminant) else {
        return Ok(Decoded::UnknownKind(discriminant.map(str::to_owned)));
    };

    serde_json::from_value(value)
        .map(Decoded::Payload)
        .map_err(|source| MalformedPayload::Fields { kind, source })
}

/// Build the reply for `entry`: slots 1..=5 in order, empty slots skipped,
/// unknown kinds dropped, malformed slots logged and dropped.
pub fn assemble(entry: &ReplyEntry) -> Vec<MessagePayload> {
    let mut payloads = Vec::with_capacity(SLOT_COUNT);
    for (slot, raw) in entry.slots() {
        let Some(raw) = raw else {
            continue;
        };
        match decode_payload(raw) {
            Ok(Decoded::Payload(payload)) => payloads.push(payload),
            Ok(Decoded::UnknownKind(kind)) => {
                debug!(
                    name = %entry.name,
                    action = %entry.action,
                    slot,
                    kind = kind.as_deref().unwrap_or("<none>"),
                    "dropping message of unknown type"
                );
                #[cfg(feature = "metrics")]
                counter!(content_metrics::SLOTS_DROPPED_TOTAL, labels::REASON => "unknown_kind")
                    .increment(1);
            },
            Err(e) => {
                warn!(
                    name = %entry.name,
                    action = %entry.action,
                    slot,
                    row = entry.row,
                    error = %e,
                    "skipping malformed message slot"
                );
                #[cfg(feature = "metrics")]
                counter!(content_metrics::SLOTS_DROPPED_TOTAL, labels::REASON => "malformed")
                    .increment(1);
            },
        }
    }
    payloads
}

/// What happened to one slot, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Empty,
    Decoded(MessageKind),
    UnknownKind(Option<String>),
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotReport {
    /// 1-based slot number.
    pub slot: usize,
    pub outcome: SlotOutcome,
}

/// Per-slot outcome of decoding `entry`, without logging.
pub fn inspect(entry: &ReplyEntry) -> Vec<SlotReport> {
    entry
        .slots()
        .map(|(slot, raw)| {
            let outcome = match raw.map(decode_payload) {
                None => SlotOutcome::Empty,
                Some(Ok(Decoded::Payload(payload))) => SlotOutcome::Decoded(payload.kind()),
                Some(Ok(Decoded::UnknownKind(kind))) => SlotOutcome::UnknownKind(kind),
                Some(Err(e)) => SlotOutcome::Malformed(e.to_string()),
            };
            SlotReport { slot, outcome }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {rstest::rstest, serde_json::json};

    use super::*;

    const TEXT: &str = r#"{"type":"text","text":"hello"}"#;
    const IMAGE: &str = r#"{"type":"image","originalContentUrl":"https://e.x/a.jpg","previewImageUrl":"https://e.x/b.jpg"}"#;

    #[test]
    fn skips_empty_slots_and_keeps_order() {
        let entry = ReplyEntry::new("Alice", "intro")
            .with_slot(1, TEXT)
            .with_slot(3, IMAGE);
        let payloads = assemble(&entry);
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0], MessagePayload::text("hello"));
        assert_eq!(payloads[1].kind(), MessageKind::Image);
    }

    #[test]
    fn unknown_kind_is_dropped_without_stopping_later_slots() {
        let entry = ReplyEntry::new("Alice", "intro")
            .with_slot(1, r#"{"type":"unknown_kind"}"#)
            .with_slot(2, TEXT);
        assert_eq!(assemble(&entry), vec![MessagePayload::text("hello")]);
    }

    #[test]
    fn malformed_slot_is_dropped() {
        let entry = ReplyEntry::new("Alice", "intro")
            .with_slot(1, "{not json")
            .with_slot(2, r#"{"type":"image"}"#)
            .with_slot(5, TEXT);
        assert_eq!(assemble(&entry), vec![MessagePayload::text("hello")]);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn dropped_slots_are_counted_by_reason() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let entry = ReplyEntry::new("Alice", "intro")
            .with_slot(1, r#"{"type":"unknown_kind"}"#)
            .with_slot(2, "{not json")
            .with_slot(3, r#"{"type":"image"}"#)
            .with_slot(4, TEXT);

        let payloads = metrics::with_local_recorder(&recorder, || assemble(&entry));
        assert_eq!(payloads.len(), 1);

        let text = handle.render();
        let dropped = content_metrics::SLOTS_DROPPED_TOTAL;
        assert!(text.contains(&format!(r#"{dropped}{{reason="unknown_kind"}} 1"#)), "{text}");
        assert!(text.contains(&format!(r#"{dropped}{{reason="malformed"}} 2"#)), "{text}");
    }

    #[test]
    fn all_slots_empty_is_valid() {
        assert!(assemble(&ReplyEntry::new("Alice", "intro")).is_empty());
    }

    #[test]
    fn never_more_than_five() {
        let mut entry = ReplyEntry::new("Alice", "intro");
        for slot in 1..=7 {
            entry = entry.with_slot(slot, TEXT);
        }
        assert_eq!(assemble(&entry).len(), SLOT_COUNT);
    }

    #[rstest]
    #[case(r#"{"type":"text","text":"hi","quickReply":{"items":[]}}"#, MessageKind::Text)]
    #[case(r#"{"type":"sticker","packageId":"446","stickerId":1988}"#, MessageKind::Sticker)]
    #[case(r#"{"type":"audio","originalContentUrl":"https://e.x/a.m4a","duration":60000}"#, MessageKind::Audio)]
    #[case(r#"{"type":"location","title":"t","address":"a","latitude":25.0,"longitude":121.5}"#, MessageKind::Location)]
    #[case(r#"{"type":"video","originalContentUrl":"https://e.x/v.mp4","previewImageUrl":"https://e.x/p.jpg"}"#, MessageKind::Video)]
    #[case(r#"{"type":"template","altText":"menu","template":{"type":"buttons","text":"x","actions":[]}}"#, MessageKind::Template)]
    #[case(r#"{"type":"flex","altText":"card","contents":{"type":"bubble"}}"#, MessageKind::Flex)]
    #[case(r#"{"type":"imagemap","baseUrl":"https://e.x/m","altText":"map","baseSize":{"width":1040,"height":1040},"actions":[]}"#, MessageKind::Imagemap)]
    fn decodes_every_kind(#[case] raw: &str, #[case] kind: MessageKind) {
        let Ok(Decoded::Payload(payload)) = decode_payload(raw) else {
            panic!("failed to decode {raw}");
        };
        assert_eq!(payload.kind(), kind);
    }

    #[test]
    fn decoded_payload_keeps_wire_shape() {
        let raw = json!({
            "type": "template",
            "altText": "menu",
            "template": { "type": "buttons", "text": "pick", "actions": [] }
        });
        let Ok(Decoded::Payload(payload)) = decode_payload(&raw.to_string()) else {
            panic!("decode failed");
        };
        assert_eq!(serde_json::to_value(payload).unwrap(), raw);
    }

    #[rstest]
    #[case(r#"{"text":"no type"}"#, None)]
    #[case(r#"{"type":"unknown_kind"}"#, Some("unknown_kind"))]
    #[case(r#"{"type":7}"#, None)]
    fn unknown_kinds(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            decode_payload(raw).unwrap(),
            Decoded::UnknownKind(expected.map(str::to_owned))
        );
    }

    #[test]
    fn non_object_is_malformed() {
        assert!(matches!(
            decode_payload("[1,2]"),
            Err(MalformedPayload::NotAnObject)
        ));
    }

    #[test]
    fn inspect_reports_each_slot() {
        let entry = ReplyEntry::new("Alice", "intro")
            .with_slot(1, TEXT)
            .with_slot(2, r#"{"type":"gif"}"#)
            .with_slot(4, "oops");
        let outcomes: Vec<SlotOutcome> = inspect(&entry).into_iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes[0], SlotOutcome::Decoded(MessageKind::Text));
        assert_eq!(outcomes[1], SlotOutcome::UnknownKind(Some("gif".into())));
        assert_eq!(outcomes[2], SlotOutcome::Empty);
        assert!(matches!(outcomes[3], SlotOutcome::Malformed(_)));
        assert_eq!(outcomes[4], SlotOutcome::Empty);
    }
}
