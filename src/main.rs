//! ensemble-bot - main entry point.

use anyhow::{bail, Result};
use clap::Parser;
use ensemble_bot::channel::TelegramSink;
use ensemble_bot::{
    BotRuntime, Config, DialogCoordinator, InMemoryStore, Localizer, TelegramChannel,
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "ensemble-bot", version, about)]
struct Args {
    /// Path to the config file (default: ~/.ensemble-bot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    ensemble_bot::logging::init_logging(&log_level);

    tracing::info!("ensemble-bot v{}", env!("CARGO_PKG_VERSION"));

    if config.telegram.bot_token.is_empty() {
        bail!(
            "No Telegram bot token configured. Set telegram.bot_token in {} or ENSEMBLE_BOT_TOKEN.",
            ensemble_bot::config::config_path().display()
        );
    }

    let store = Arc::new(InMemoryStore::new());
    let coordinator = Arc::new(DialogCoordinator::new(store, config.planner.clone()));

    let channel = Arc::new(TelegramChannel::new(
        config.telegram.bot_token.clone(),
        config.telegram.allowed_users.clone(),
    ));
    channel.init().await?;

    let sink = Arc::new(TelegramSink::new(
        channel.clone(),
        Localizer::new(&config.language),
    ));

    // Opportunistic sweep; lookup-time expiry keeps things correct even if
    // this never runs.
    let sweeper = coordinator.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tick.tick().await;
            let evicted = sweeper.purge_expired_sessions();
            if evicted > 0 {
                tracing::debug!(evicted, "expired sessions swept");
            }
        }
    });

    let (tx, rx) = mpsc::channel(128);
    let listener = channel.clone();
    tokio::spawn(async move { listener.listen(tx).await });

    let runtime = BotRuntime::new(coordinator, sink);
    tokio::select! {
        () = runtime.run(rx) => {}
        res = shutdown_signal() => {
            res?;
            tracing::info!("shutdown signal received, stopping");
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
