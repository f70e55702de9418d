use std::sync::Arc;

use {
    rand::Rng,
    roster_channels::PlatformGateway,
    roster_common::{InboundEvent, MessagePayload},
    roster_content::ContentStore,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use roster_metrics::{counter, histogram, labels, responder as responder_metrics};

use crate::{
    error::Result,
    resolve::{IntentResolver, MissReason, Resolution},
};

/// Why an event produced no reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SilentReason {
    Miss(MissReason),
    /// The entry resolved but none of its slots decoded.
    EmptyEntry { name: String, action: String },
}

impl SilentReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Miss(reason) => reason.label(),
            Self::EmptyEntry { .. } => "empty_entry",
        }
    }
}

/// Messages ready to send, or why there are none.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Messages {
        /// `name/action` of the source row, or `roster` for the listing.
        source: String,
        messages: Vec<MessagePayload>,
    },
    Silent(SilentReason),
}

/// What [`Responder::handle`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Replied { source: String, count: usize },
    Silent(SilentReason),
}

/// Resolve-and-reply flow for one platform.
///
/// Collaborators are passed in; the responder keeps no state between
/// events besides the store's snapshot cache.
pub struct Responder {
    store: Arc<ContentStore>,
    resolver: IntentResolver,
    gateway: Arc<dyn PlatformGateway>,
}

impl Responder {
    pub fn new(
        store: Arc<ContentStore>,
        resolver: IntentResolver,
        gateway: Arc<dyn PlatformGateway>,
    ) -> Self {
        Self {
            store,
            resolver,
            gateway,
        }
    }

    /// Resolve `event` and assemble its messages without sending anything.
    pub fn render<R: Rng + ?Sized>(&self, event: &InboundEvent, rng: &mut R) -> Result<Rendered> {
        let table = self
            .store
            .snapshot()
            .inspect_err(|e| error!(error = %e, "content table unavailable, not replying"))?;

        let resolution = self.resolver.resolve(event, &table, rng);
        let source = match &resolution {
            Resolution::Entry(entry) => format!("{}/{}", entry.name, entry.action),
            Resolution::Roster(_) => "roster".to_string(),
            Resolution::Miss(reason) => {
                debug!(kind = event.kind(), reason = reason.label(), %reason, "no reply");
                return Ok(Rendered::Silent(SilentReason::Miss(reason.clone())));
            },
        };
        let empty_entry = match &resolution {
            Resolution::Entry(entry) => Some(SilentReason::EmptyEntry {
                name: entry.name.clone(),
                action: entry.action.clone(),
            }),
            _ => None,
        };

        let messages = resolution.into_messages();
        if messages.is_empty() {
            warn!(source = %source, "resolved entry has no sendable messages");
            return Ok(Rendered::Silent(empty_entry.unwrap_or(SilentReason::Miss(
                MissReason::NoMatch,
            ))));
        }
        Ok(Rendered::Messages { source, messages })
    }

    /// Resolve `event` and reply through the gateway. Misses send nothing;
    /// transport errors are returned as-is.
    pub async fn handle(&self, event: &InboundEvent) -> Result<ReplyOutcome> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        #[cfg(feature = "metrics")]
        counter!(responder_metrics::EVENTS_RECEIVED_TOTAL, labels::KIND => event.kind()).increment(1);

        info!(
            kind = event.kind(),
            user_id = event.user_id().unwrap_or("unknown"),
            "inbound event"
        );

        // ThreadRng is not Send; keep it out of the await below.
        let rendered = {
            let mut rng = rand::rng();
            self.render(event, &mut rng)?
        };

        let (source, messages) = match rendered {
            Rendered::Messages { source, messages } => (source, messages),
            Rendered::Silent(reason) => {
                #[cfg(feature = "metrics")]
                counter!(responder_metrics::SILENT_TOTAL, labels::REASON => reason.label())
                    .increment(1);
                return Ok(ReplyOutcome::Silent(reason));
            },
        };

        self.gateway
            .reply(event.reply_token(), &messages)
            .await
            .inspect_err(|e| {
                error!(gateway = self.gateway.id(), source = %source, error = %e, "reply failed");
                #[cfg(feature = "metrics")]
                counter!(
                    responder_metrics::DELIVERY_FAILURES_TOTAL,
                    labels::GATEWAY => self.gateway.id().to_string()
                )
                .increment(1);
            })?;

        info!(source = %source, count = messages.len(), "replied");

        #[cfg(feature = "metrics")]
        {
            let gateway = self.gateway.id().to_string();
            counter!(responder_metrics::REPLIES_SENT_TOTAL, labels::GATEWAY => gateway.clone())
                .increment(1);
            counter!(responder_metrics::MESSAGES_SENT_TOTAL, labels::GATEWAY => gateway)
                .increment(messages.len() as u64);
            histogram!(responder_metrics::PROCESSING_DURATION_SECONDS)
                .record(start.elapsed().as_secs_f64());
        }
        Ok(ReplyOutcome::Replied {
            source,
            count: messages.len(),
        })
    }

    /// Handle events one after another. A failure on one event does not
    /// stop the rest.
    pub async fn handle_all(&self, events: &[InboundEvent]) -> Vec<Result<ReplyOutcome>> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.handle(event).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use {
        rand::{SeedableRng, rngs::StdRng},
        roster_channels::DryRunGateway,
        roster_config::{ReloadPolicy, ResolverConfig},
        std::path::PathBuf,
    };

    use {super::*, crate::error::Error};

    const TEXT_HI: &str = r#""{""type"":""text"",""text"":""hi""}""#;
    const IMAGE: &str = r#""{""type"":""image"",""originalContentUrl"":""https://e.x/a.jpg"",""previewImageUrl"":""https://e.x/b.jpg""}""#;

    fn write_table(dir: &tempfile::TempDir, rows: &[String]) -> PathBuf {
        let path = dir.path().join("reply_messages.csv");
        let mut body = String::from("name,action,message1,message2,message3,message4,message5\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        std::fs::write(&path, body).unwrap();
        path
    }

    fn sample_rows() -> Vec<String> {
        vec![
            format!("Alice,intro,{TEXT_HI},,{IMAGE},,"),
            format!("Alicia,intro,{TEXT_HI},,,,"),
            "Ghost,intro,,,,,".to_string(),
            format!("wallpaper1,img,{IMAGE},,,,"),
            r#"Broken,intro,"{""type"":""unknown_kind""}",{bad,,,"#.to_string(),
        ]
    }

    fn responder(path: PathBuf, gateway: Arc<DryRunGateway>) -> Responder {
        Responder::new(
            Arc::new(ContentStore::new(path, ReloadPolicy::OnChange)),
            IntentResolver::new(ResolverConfig::default()),
            gateway,
        )
    }

    fn text(body: &str) -> InboundEvent {
        InboundEvent::Text {
            reply_token: "r1".into(),
            text: body.into(),
            user_id: Some("U1".into()),
        }
    }

    #[tokio::test]
    async fn replies_with_assembled_slots() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::new());
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        let outcome = responder.handle(&text("Alice")).await.unwrap();
        assert_eq!(outcome, ReplyOutcome::Replied {
            source: "Alice/intro".into(),
            count: 2
        });

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_token, "r1");
        assert_eq!(sent[0].messages[0], MessagePayload::text("hi"));
    }

    #[tokio::test]
    async fn miss_never_calls_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::failing(500));
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        let outcome = responder.handle(&text("Zelda")).await.unwrap();
        assert_eq!(outcome, ReplyOutcome::Silent(SilentReason::Miss(MissReason::NoMatch)));
    }

    #[tokio::test]
    async fn entry_without_sendable_slots_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::failing(500));
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        for name in ["Ghost", "Broken"] {
            let outcome = responder.handle(&text(name)).await.unwrap();
            assert_eq!(
                outcome,
                ReplyOutcome::Silent(SilentReason::EmptyEntry {
                    name: name.into(),
                    action: "intro".into()
                })
            );
        }
    }

    #[tokio::test]
    async fn postback_reply() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::new());
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        let event = InboundEvent::Postback {
            reply_token: "r9".into(),
            data: "name=wallpaper1&action=img".into(),
            user_id: None,
        };
        let outcome = responder.handle(&event).await.unwrap();
        assert!(matches!(outcome, ReplyOutcome::Replied { count: 1, .. }));
        assert_eq!(gateway.sent()[0].reply_token, "r9");
    }

    #[tokio::test]
    async fn roster_listing() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::new());
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        responder.handle(&text("角色列表")).await.unwrap();
        assert_eq!(gateway.sent()[0].messages, vec![MessagePayload::text(
            "Alice\nAlicia\nGhost\nBroken"
        )]);
    }

    #[tokio::test]
    async fn transport_error_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::failing(502));
        let responder = responder(write_table(&dir, &sample_rows()), gateway);

        let err = responder.handle(&text("Alicia")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Channel(roster_channels::Error::Transport { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn missing_table_is_a_content_error_and_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::new());
        let responder = responder(dir.path().join("absent.csv"), Arc::clone(&gateway));

        let err = responder.handle(&text("Alice")).await.unwrap_err();
        assert!(matches!(err, Error::Content(_)));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn handle_all_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(DryRunGateway::new());
        let responder = responder(write_table(&dir, &sample_rows()), Arc::clone(&gateway));

        let outcomes = responder
            .handle_all(&[text("Zelda"), text("Alice"), text("抽桌布")])
            .await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(Result::is_ok));
        assert_eq!(gateway.sent().len(), 2);
    }

    #[test]
    fn silent_reasons_have_stable_labels() {
        let empty = SilentReason::EmptyEntry {
            name: "Ghost".into(),
            action: "intro".into(),
        };
        assert_eq!(empty.label(), "empty_entry");
        assert_eq!(SilentReason::Miss(MissReason::NoMatch).label(), "no_match");
        assert_eq!(
            SilentReason::Miss(MissReason::EmptyPool {
                action: "img".into()
            })
            .label(),
            "empty_pool"
        );
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn handle_counts_events_replies_and_misses() {
        use roster_metrics::responder as responder_metrics;

        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        // Current-thread runtime: the guard covers every await below.
        let _guard = metrics::set_default_local_recorder(&recorder);

        let dir = tempfile::tempdir().unwrap();
        let responder = responder(
            write_table(&dir, &sample_rows()),
            Arc::new(DryRunGateway::new()),
        );
        responder.handle(&text("Alice")).await.unwrap();
        responder.handle(&text("Zelda")).await.unwrap();
        responder.handle(&text("Ghost")).await.unwrap();

        let text = handle.render();
        assert!(
            text.contains(&format!(
                r#"{}{{kind="text"}} 3"#,
                responder_metrics::EVENTS_RECEIVED_TOTAL
            )),
            "{text}"
        );
        assert!(
            text.contains(&format!(
                r#"{}{{gateway="dry-run"}} 1"#,
                responder_metrics::REPLIES_SENT_TOTAL
            )),
            "{text}"
        );
        assert!(
            text.contains(&format!(
                r#"{}{{gateway="dry-run"}} 2"#,
                responder_metrics::MESSAGES_SENT_TOTAL
            )),
            "{text}"
        );
        for reason in ["no_match", "empty_entry"] {
            assert!(
                text.contains(&format!(
                    r#"{}{{reason="{reason}"}} 1"#,
                    responder_metrics::SILENT_TOTAL
                )),
                "{text}"
            );
        }
    }

    #[test]
    fn render_is_deterministic_with_seeded_rng() {
        let dir = tempfile::tempdir().unwrap();
        let responder = responder(
            write_table(&dir, &sample_rows()),
            Arc::new(DryRunGateway::new()),
        );
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            responder.render(&text("抽角色"), &mut rng).unwrap()
        };
        assert_eq!(draw(3), draw(3));
    }
}
