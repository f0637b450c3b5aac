//! Chat Feed Panel
//!
//! Entry point for the control panel server and its companion subcommands.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chat_feed_panel::config::{AppConfig, Cli, Command, TopicArgs, WatchArgs};
use chat_feed_panel::widget::{
    DEFAULT_TOPIC_PLACEHOLDER, FeedPoller, PanelClient, TerminalFeed, TopicFetcher, TopicOutcome,
    VirtualButton, VirtualInput,
};
use chat_feed_panel::{converse, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before the CLI reads its env fallbacks
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED). Stdout belongs to chat output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        None | Some(Command::Serve) => {
            let config = match AppConfig::from_cli(&cli) {
                Ok(config) => Arc::new(config),
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    std::process::exit(1);
                }
            };
            server::start_server(config).await
        }
        Some(Command::Converse(args)) => converse::run(args).await,
        Some(Command::Watch(args)) => watch(args).await,
        Some(Command::Topic(args)) => topic(args).await,
    }
}

/// Follow a panel's feed until Ctrl-C.
async fn watch(args: &WatchArgs) -> anyhow::Result<()> {
    let poller = FeedPoller::new(PanelClient::new(&args.url)?);
    let mut feed = TerminalFeed::new(args.rows, std::io::stdout());

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        stop.cancel();
    });

    let period = std::time::Duration::from_secs(args.interval.max(1));
    poller.run(&mut feed, period, cancel).await;
    Ok(())
}

/// Request one topic, as a click on the topic button would.
async fn topic(args: &TopicArgs) -> anyhow::Result<()> {
    let fetcher = TopicFetcher::new(PanelClient::new(&args.url)?);
    let mut input = VirtualInput::new(DEFAULT_TOPIC_PLACEHOLDER).with_value(&args.current);
    let mut button = VirtualButton::default();

    match fetcher.on_click(&mut input, &mut button).await {
        TopicOutcome::Applied(topic) => println!("{topic}"),
        TopicOutcome::Failed { hint } => {
            eprintln!("{}", hint.as_deref().unwrap_or("Topic request failed."));
            std::process::exit(1);
        }
        TopicOutcome::Ignored => {}
    }
    Ok(())
}
