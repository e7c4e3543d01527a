use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use allocwatch_client::{ClientConfig, HttpClient};
use allocwatch_core::{
    ChannelNotifier, MemoryStore, Notice, ResourceStore, ViewState, WatchConfig, WatchLifecycle,
};
use allocwatch_observe::{LoggerConfig, LoggerFormat, LoggerLevel, logger_init};
use allocwatch_prometheus::PrometheusMetrics;

/// Open the allocation screen for one allocation and keep it live until Ctrl+C.
#[derive(Debug, Parser)]
#[command(name = "allocation-view", version)]
struct Args {
    /// Allocation id to watch.
    allocation: String,

    /// Orchestrator agent address.
    #[arg(long, env = "ALLOCWATCH_ADDR", default_value = allocwatch_client::DEFAULT_ADDRESS)]
    address: String,

    /// Log filter directive.
    #[arg(long, env = "ALLOCWATCH_LOG", default_value = "info")]
    log_level: String,

    /// Log output: text, json or journald.
    #[arg(long, env = "ALLOCWATCH_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Interval between health check polls, in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    health_interval_ms: u64,

    /// How often the store snapshot is printed, in seconds.
    #[arg(long, default_value_t = 10)]
    snapshot_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) Logger
    let cfg = LoggerConfig {
        level: LoggerLevel::new(&args.log_level)?,
        format: args.log_format.parse::<LoggerFormat>()?,
        ..Default::default()
    };
    logger_init(&cfg)?;
    info!(format = %cfg.format, level = %cfg.level, "logger initialized");

    // 2) Collaborators
    let client = HttpClient::new(ClientConfig {
        address: args.address.clone(),
        ..Default::default()
    })
    .context("invalid agent address")?;
    let store = MemoryStore::new();
    let metrics = PrometheusMetrics::new()?;
    let (notifier, mut notices) = ChannelNotifier::new();

    let config = WatchConfig {
        health_interval_ms: args.health_interval_ms,
        ..Default::default()
    };
    let lifecycle = WatchLifecycle::new(
        Arc::new(client),
        Arc::new(store.clone()),
        Arc::new(notifier),
        Arc::new(metrics.clone()),
        config,
    )?;
    info!(address = %args.address, "watch lifecycle ready");

    // 3) Enter the view
    let state = ViewState::new(args.allocation.clone());
    if lifecycle.start(&state).await.is_none() {
        drain_notices(&mut notices);
        lifecycle.shutdown().await;
        anyhow::bail!("allocation {} could not be loaded", args.allocation);
    }
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            show(&notice);
        }
    });
    for handle in lifecycle.watchers() {
        debug!(?handle, "watching");
    }
    info!("press Ctrl+C to stop");

    // 4) Print snapshots until interrupted
    let mut ticker = tokio::time::interval(Duration::from_secs(args.snapshot_secs.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("failed to listen for Ctrl+C")?;
                break;
            }
            _ = ticker.tick() => snapshot(&store, &state),
        }
    }

    // 5) Exit the view
    info!("shutting down...");
    lifecycle.shutdown().await;
    debug!(metrics = %metrics.encode_text()?, "final metrics");
    Ok(())
}

fn show(notice: &Notice) {
    warn!(title = %notice.title, "{}", notice.message);
}

/// Show every notice already queued. Returns how many were shown.
fn drain_notices(notices: &mut UnboundedReceiver<Notice>) -> usize {
    let mut shown = 0;
    while let Ok(notice) = notices.try_recv() {
        show(&notice);
        shown += 1;
    }
    shown
}

fn snapshot(store: &MemoryStore, state: &ViewState) {
    let id = state.allocation_id.as_str();
    let Some(alloc) = store.allocation(id) else {
        warn!(allocation = id, "allocation no longer cached");
        return;
    };
    let checks = store.checks(id).map(|c| c.summary()).unwrap_or_default();
    info!(
        allocation = alloc.short_id(),
        index = store.allocation_index(id).unwrap_or(0),
        client_status = %alloc.client_status,
        desired_status = %alloc.desired_status,
        tasks = alloc.task_states().count(),
        checks_ok = checks.success,
        checks_failing = checks.failure,
        checks_pending = checks.pending,
        "snapshot"
    );
}
