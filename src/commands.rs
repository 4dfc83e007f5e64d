use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cli::Commands;
use crate::config::GistwallConfig;
use crate::history::HistoryStore;
use crate::reconcile::Reconciler;
use crate::scheduler::{self, Scheduler};
use crate::ui::prelude::*;

pub async fn handle_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = GistwallConfig::load(config_path)?;

    match command {
        Commands::Run => handle_run(&config).await,
        Commands::Check => handle_check(&config).await,
        Commands::History { limit } => handle_history(&config, limit),
    }
}

fn prepare(config: &GistwallConfig) -> Result<Reconciler> {
    let reconciler = Reconciler::from_config(config).context("creating HTTP client")?;
    reconciler.store().ensure_schema().with_context(|| {
        format!(
            "creating history tables in {}",
            reconciler.store().path().display()
        )
    })?;
    Ok(reconciler)
}

async fn handle_run(config: &GistwallConfig) -> Result<()> {
    let reconciler = Arc::new(Mutex::new(prepare(config)?));
    let scheduler = Scheduler::new(config.cadence()).run_immediately(config.run_on_start);

    let stop = CancellationToken::new();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        match scheduler::shutdown_signal().await {
            Ok(name) => emit(
                Level::Info,
                "run.shutdown",
                &format!("Received {}, shutting down...", name),
                None,
            ),
            Err(e) => emit(
                Level::Warn,
                "run.signal.error",
                &format!("Failed to listen for shutdown signals: {}", e),
                None,
            ),
        }
        signal_stop.cancel();
    });

    emit(
        Level::Info,
        "run.start",
        &format!(
            "Watching {} every {}s",
            config.endpoint.cyan(),
            scheduler.cadence().as_secs()
        ),
        Some(serde_json::json!({
            "endpoint": config.endpoint,
            "interval_secs": scheduler.cadence().as_secs(),
            "run_on_start": config.run_on_start,
        })),
    );

    let ticks = scheduler
        .run(stop, || {
            let reconciler = reconciler.clone();
            async move {
                reconciler.lock().await.tick_and_report().await;
            }
        })
        .await;

    emit(
        Level::Info,
        "run.stopped",
        &format!("Stopped after {} checks", ticks),
        Some(serde_json::json!({ "ticks": ticks })),
    );
    Ok(())
}

async fn handle_check(config: &GistwallConfig) -> Result<()> {
    let mut reconciler = prepare(config)?;
    if !reconciler.tick_and_report().await {
        anyhow::bail!("wallpaper check failed");
    }
    Ok(())
}

fn handle_history(config: &GistwallConfig, limit: usize) -> Result<()> {
    let store = HistoryStore::new(config.database_path());
    store
        .ensure_schema()
        .with_context(|| format!("opening history in {}", store.path().display()))?;
    let records = store.recent(limit).context("reading history")?;

    if records.is_empty() {
        emit(
            Level::Info,
            "history.empty",
            "No wallpaper changes recorded yet.",
            None,
        );
        return Ok(());
    }

    for record in records {
        let applied_at = record.applied_at.clone().unwrap_or_default();
        emit(
            Level::Info,
            "history.entry",
            &format!(
                "#{} {} {} (published {})",
                record.id,
                applied_at.dimmed(),
                record.image_url.cyan(),
                record.timestamp
            ),
            Some(serde_json::json!({
                "id": record.id,
                "image_url": record.image_url,
                "timestamp": record.timestamp,
                "applied_at": record.applied_at,
            })),
        );
    }
    Ok(())
}
