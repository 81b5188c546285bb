//! Outbox agent.
//!
//! Watches a local outbox directory and ships everything in it to the
//! collection server: once at start-up and then at fixed daily times.

mod config;
mod logging;
mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use outbox_collector::HttpTransport;
use outbox_notify::WebhookNotifier;
use outbox_sync::SyncOrchestrator;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use config::AgentConfig;
use scheduler::Scheduler;

#[derive(Parser)]
#[command(
    name = "outbox-agent",
    version,
    about = "Ships outbox files and folders to the collection server"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    ///
    /// Defaults to `~/.config/outbox/agent.toml`; created with defaults if
    /// missing.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run a single sync pass and exit. Exits non-zero if any entry failed.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let (config, created) = AgentConfig::load_or_init(&config_path)?;

    let _log_guard = logging::init(&config.log)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        device_id = %config.device_id,
        outbox = %config.outbox_dir.display(),
        server = %config.server_url,
        "starting outbox agent"
    );
    if created {
        warn!(path = %config_path.display(), "no configuration found, wrote defaults");
    }

    std::fs::create_dir_all(&config.outbox_dir).with_context(|| {
        format!("failed to create outbox {}", config.outbox_dir.display())
    })?;

    let transport = Arc::new(HttpTransport::new(&config.transport_config())?);
    let mut orchestrator = SyncOrchestrator::new(config.sync_config(), transport);
    if let Some(webhook) = config.webhook_config() {
        orchestrator = orchestrator.with_notifier(Arc::new(WebhookNotifier::new(&webhook)?));
    }
    let orchestrator = Arc::new(orchestrator);

    if cli.once {
        let report = orchestrator.run().await;
        scheduler::log_report(&report);
        if let Some(err) = report.scan_error {
            anyhow::bail!("sync run could not read the outbox: {err}");
        }
        if report.failed() > 0 {
            anyhow::bail!("sync run finished with {} failed entries", report.failed());
        }
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                shutdown.cancel();
            }
        });
    }

    let times = config.schedule_times()?;
    let runs = Scheduler::new(times, config.schedule.run_at_start)
        .run(orchestrator, shutdown)
        .await;

    info!(runs, "outbox agent stopped");
    Ok(())
}
