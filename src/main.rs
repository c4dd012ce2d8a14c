//! harvest-notifier: binary entrypoint.
//! Loads configuration, checks Discord access, then polls the resource feeds
//! until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use harvest_notifier::config::Config;
use harvest_notifier::ingest::providers::rss::{http_client, RssFeedSource};
use harvest_notifier::ingest::types::FeedSource;
use harvest_notifier::metrics::Metrics;
use harvest_notifier::notify::discord::DiscordNotifier;
use harvest_notifier::{FeedPoller, Scheduler, SeenEntrySet};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("harvest_notifier=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler we just run until killed.
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    warn!("received Ctrl-C, stopping after the current poll");
}

async fn run() -> anyhow::Result<()> {
    let cfg = Config::from_env().context("loading configuration")?;
    info!(
        target_server = %cfg.target_server,
        interval_secs = cfg.check_interval.as_secs(),
        max_seen = cfg.max_seen,
        feeds = cfg.feed_urls.len(),
        "configuration loaded"
    );

    // Keep the recorder alive for the whole run.
    let _metrics = match cfg.metrics_addr {
        Some(addr) => {
            let m = Metrics::init()?;
            m.serve(addr).await.context("binding metrics endpoint")?;
            Some(m)
        }
        None => None,
    };

    let notifier = DiscordNotifier::new(cfg.discord_token.clone(), cfg.channel_id);
    let bot = notifier
        .verify()
        .await
        .context("discord authentication / channel check")?;
    info!(bot = %bot.username, channel_id = cfg.channel_id, "discord ready");

    let client = http_client(cfg.fetch_timeout, &cfg.user_agent)?;
    let sources: Vec<Box<dyn FeedSource>> = cfg
        .feed_urls
        .iter()
        .map(|u| Box::new(RssFeedSource::from_url(u.as_str(), client.clone())) as Box<dyn FeedSource>)
        .collect();

    let poller = FeedPoller::new(
        sources,
        Arc::new(notifier),
        cfg.target_server.clone(),
        SeenEntrySet::with_capacity(cfg.max_seen),
    );

    let poller = Scheduler::new(poller, cfg.check_interval)
        .run_until(shutdown_signal())
        .await;
    info!(seen = poller.seen().len(), "shut down cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}
