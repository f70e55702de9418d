mod check_commands;
mod webhook_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    roster_auto_reply::{IntentResolver, Rendered, Responder},
    roster_channels::DryRunGateway,
    roster_common::InboundEvent,
    roster_config::RosterConfig,
    roster_content::ContentStore,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "roster", about = "Roster, a LINE character-roster reply bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./roster.toml and ~/.config/roster/).
    #[arg(long, global = true, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Reply table to use instead of the configured `content.path`.
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Print collected metrics (Prometheus text format) to stderr on exit.
    #[cfg(feature = "metrics")]
    #[arg(long, global = true, default_value_t = false)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and the reply table.
    Check,
    /// Print every character name.
    List,
    /// Resolve a message or postback and print the reply payloads as JSON.
    Resolve {
        /// Message text.
        #[arg(required_unless_present = "postback")]
        text: Option<String>,
        /// Postback data, e.g. `name=Alice&action=intro`.
        #[arg(long, conflicts_with = "text")]
        postback: Option<String>,
    },
    /// Handle a LINE webhook body read from a file (`-` for stdin).
    Webhook {
        file: PathBuf,
        /// Record replies and print them instead of calling the LINE API.
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries command output.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the config and apply the `--table` override.
fn load_config(cli: &Cli) -> anyhow::Result<(RosterConfig, Option<PathBuf>)> {
    let (mut config, source) = roster_config::discover_and_load(cli.config.as_deref())?;
    if let Some(ref table) = cli.table {
        config.content.path = table.clone();
    }
    Ok((config, source))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "roster starting");

    #[cfg(feature = "metrics")]
    let metrics = cli
        .metrics
        .then(|| {
            roster_metrics::init_metrics(roster_metrics::MetricsRecorderConfig {
                enabled: true,
                global_labels: vec![("version".into(), env!("CARGO_PKG_VERSION").into())],
            })
        })
        .transpose()?;

    let (config, source) = load_config(&cli)?;

    let result = match cli.command {
        Commands::Check => check_commands::check(&config, source.as_deref()),
        Commands::List => list(&config),
        Commands::Resolve { text, postback } => resolve(&config, text, postback),
        Commands::Webhook { file, dry_run } => {
            webhook_commands::handle_webhook(config, &file, dry_run).await
        },
    };

    #[cfg(feature = "metrics")]
    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }

    result
}

fn list(config: &RosterConfig) -> anyhow::Result<()> {
    let store = ContentStore::from_config(&config.content);
    let table = store.snapshot()?;
    for name in table.names(&config.resolver.intro_action) {
        println!("{name}");
    }
    Ok(())
}

fn resolve(
    config: &RosterConfig,
    text: Option<String>,
    postback: Option<String>,
) -> anyhow::Result<()> {
    let event = match (postback, text) {
        (Some(data), _) => InboundEvent::Postback {
            reply_token: String::new(),
            data,
            user_id: None,
        },
        (None, Some(text)) => InboundEvent::Text {
            reply_token: String::new(),
            text,
            user_id: None,
        },
        (None, None) => anyhow::bail!("either TEXT or --postback is required"),
    };

    let responder = Responder::new(
        Arc::new(ContentStore::from_config(&config.content)),
        IntentResolver::new(config.resolver.clone()),
        Arc::new(DryRunGateway::new()),
    );
    let rendered = responder.render(&event, &mut rand::rng())?;

    match rendered {
        Rendered::Messages { source, messages } => {
            info!(source = %source, count = messages.len(), "resolved");
            let json = serde_json::to_string_pretty(&messages)
                .context("failed to serialize messages")?;
            println!("{json}");
        },
        Rendered::Silent(reason) => {
            eprintln!("no reply: {reason:?}");
            println!("[]");
        },
    }
    Ok(())
}
