use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    roster_auto_reply::{IntentResolver, ReplyOutcome, Responder},
    roster_channels::{DryRunGateway, PlatformGateway},
    roster_config::RosterConfig,
    roster_content::ContentStore,
    roster_line::{LineGateway, decode_webhook},
    serde_json::json,
    tokio::io::AsyncReadExt,
    tracing::{error, info},
};

async fn read_body(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .context("failed to read webhook body from stdin")?;
        return Ok(body);
    }
    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))
}

pub async fn handle_webhook(config: RosterConfig, file: &Path, dry_run: bool) -> Result<()> {
    let body = read_body(file).await?;
    let events = decode_webhook(&body)?;
    info!(count = events.len(), dry_run, "decoded webhook");

    let recorder = dry_run.then(|| Arc::new(DryRunGateway::new()));
    let gateway: Arc<dyn PlatformGateway> = match recorder {
        Some(ref recorder) => Arc::clone(recorder) as Arc<dyn PlatformGateway>,
        None => Arc::new(LineGateway::new(config.line.clone())?),
    };

    let responder = Responder::new(
        Arc::new(ContentStore::from_config(&config.content)),
        IntentResolver::new(config.resolver),
        gateway,
    );

    let mut failures = 0;
    for (event, outcome) in events.iter().zip(responder.handle_all(&events).await) {
        match outcome {
            Ok(ReplyOutcome::Replied { source, count }) => {
                eprintln!("{}: replied with {count} message(s) from {source}", event.kind());
            },
            Ok(ReplyOutcome::Silent(reason)) => {
                eprintln!("{}: no reply ({reason:?})", event.kind());
            },
            Err(e) => {
                error!(kind = event.kind(), error = %e, "event failed");
                failures += 1;
            },
        }
    }

    if let Some(recorder) = recorder {
        let sent: Vec<_> = recorder
            .sent()
            .into_iter()
            .map(|r| json!({ "replyToken": r.reply_token, "messages": r.messages }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sent)?);
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} event(s) failed", events.len());
    }
    Ok(())
}
