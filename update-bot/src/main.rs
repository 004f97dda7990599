use anyhow::Context;
use clap::Parser;
use interfaces::NotifierSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use update_bot::config::{load_channels, load_feeds, load_token};
use update_bot::{
    BotSettings, DiscordSink, FeedSource, LoggingSink, Module, RoadmapSource, SnapshotStore,
    UpdateModule,
};

/// How long in-flight ticks get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Polls feeds and the roadmap changelog and posts what is new to chat.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON array of feed configurations
    #[arg(long, env = "UPDATE_BOT_FEEDS", default_value = "rssFeeds.json")]
    feeds: PathBuf,

    /// JSON object mapping channel names to channel ids
    #[arg(long, env = "UPDATE_BOT_CHANNELS", default_value = "channels.json")]
    channels: PathBuf,

    /// File holding the bot token
    #[arg(long, env = "UPDATE_BOT_TOKEN_FILE", default_value = "token.txt")]
    token_file: PathBuf,

    /// Directory under which `Modules/` snapshots are kept
    #[arg(long, env = "UPDATE_BOT_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Seconds between two pulls of the same source
    #[arg(long, env = "UPDATE_BOT_POLL_INTERVAL_SECS", default_value_t = 1800)]
    poll_interval_secs: u64,

    /// Channel name that receives roadmap changelog updates
    #[arg(long, env = "UPDATE_BOT_ROADMAP_CHANNEL", default_value = "longevityNews")]
    roadmap_channel: String,

    /// Do not watch the roadmap changelog
    #[arg(long, env = "UPDATE_BOT_NO_ROADMAP")]
    no_roadmap: bool,

    /// Log messages instead of sending them
    #[arg(long, env = "UPDATE_BOT_DRY_RUN")]
    dry_run: bool,
}

impl Args {
    fn settings(&self) -> BotSettings {
        BotSettings {
            data_dir: self.data_dir.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            roadmap_channel: (!self.no_roadmap).then(|| self.roadmap_channel.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let settings = args.settings();

    let feeds = load_feeds(&args.feeds)?;
    let channels = load_channels(&args.channels)?;

    let sink: Arc<dyn NotifierSink> = if args.dry_run {
        info!("Dry run: messages are logged, not sent");
        Arc::new(LoggingSink::new())
    } else {
        let token = load_token(&args.token_file)?;
        Arc::new(DiscordSink::new(&token)?)
    };

    let store = SnapshotStore::new(&settings.data_dir);
    let (failures_tx, mut failures_rx) = mpsc::unbounded_channel();
    let mut modules: Vec<Box<dyn Module>> = Vec::new();

    for feed in feeds {
        let channel = channels.resolve(&feed.channel_name)?;
        let url = feed.feed_url.clone();
        let source = FeedSource::new(feed, channel).with_context(|| format!("setting up {}", url))?;
        modules.push(Box::new(UpdateModule::new(
            source,
            sink.clone(),
            store.clone(),
            settings.poll_interval,
            failures_tx.clone(),
        )));
    }

    if let Some(name) = &settings.roadmap_channel {
        let channel = channels.resolve(name)?;
        modules.push(Box::new(UpdateModule::new(
            RoadmapSource::new(channel)?,
            sink.clone(),
            store.clone(),
            settings.poll_interval,
            failures_tx.clone(),
        )));
    }

    for module in &mut modules {
        module
            .enable()
            .await
            .with_context(|| format!("enabling {}", module.name()))?;
    }

    info!("Bot is now running with {} modules. Press CTRL-C to exit.", modules.len());

    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            Ok(())
        }
        Some(failure) = failures_rx.recv() => {
            error!("{} failed: {}", failure.module, failure.error);
            Err(anyhow::Error::new(failure.error).context(format!("{} failed", failure.module)))
        }
    };

    for module in &mut modules {
        module.disable();
    }

    let stopped = async {
        for module in &mut modules {
            module.wait_stopped().await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, stopped).await.is_err() {
        warn!("Modules still busy after {:?}, exiting anyway", SHUTDOWN_GRACE);
    }

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
