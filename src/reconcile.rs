use std::path::PathBuf;

use crate::applier::WallpaperApplier;
use crate::config::GistwallConfig;
use crate::error::SyncResult;
use crate::fetch;
use crate::history::{HistoryStore, ImageChangeRecord};
use crate::remote::{self, RemoteState};
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Checking,
    Applying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged(ImageChangeRecord),
    Applied(ImageChangeRecord),
}

/// Whether the desired state differs from what was last applied.
///
/// Timestamps compare as plain strings, which only orders correctly for a
/// fixed zero-padded format.
pub fn needs_apply(last: &ImageChangeRecord, desired: &RemoteState) -> bool {
    last.timestamp.as_str() < desired.timestamp.as_str() || last.image_url != desired.image_url
}

pub struct Reconciler {
    client: reqwest::Client,
    endpoint: String,
    store: HistoryStore,
    download_dir: PathBuf,
    applier: WallpaperApplier,
    state: ReconcileState,
}

impl Reconciler {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        store: HistoryStore,
        download_dir: impl Into<PathBuf>,
        applier: WallpaperApplier,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            store,
            download_dir: download_dir.into(),
            applier,
            state: ReconcileState::Idle,
        }
    }

    pub fn from_config(config: &GistwallConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("gistwall/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(
            client,
            config.endpoint.clone(),
            HistoryStore::new(config.database_path()),
            config.download_dir.clone(),
            WallpaperApplier::new(config.helper.clone(), config.helper_args.clone()),
        ))
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Run one check-and-apply cycle. Nothing is rolled back when a step
    /// fails halfway through.
    pub async fn tick(&mut self) -> SyncResult<TickOutcome> {
        debug_assert_eq!(self.state(), ReconcileState::Idle);
        self.state = ReconcileState::Checking;
        let result = self.run_tick().await;
        self.state = ReconcileState::Idle;
        result
    }

    async fn run_tick(&mut self) -> SyncResult<TickOutcome> {
        let last = self.store.record_latest()?;
        let message = if last.is_empty() {
            "No wallpaper applied yet".to_string()
        } else {
            format!("Last applied {} ({})", last.image_url, last.timestamp)
        };
        emit(Level::Debug, "reconcile.last", &message, None);

        let desired = remote::fetch_desired_state(&self.client, &self.endpoint).await?;

        if !needs_apply(&last, &desired) {
            emit(
                Level::Debug,
                "reconcile.tick.unchanged",
                &format!("Wallpaper already up to date ({})", last.image_url),
                None,
            );
            return Ok(TickOutcome::Unchanged(last));
        }

        self.state = ReconcileState::Applying;
        emit(
            Level::Debug,
            "reconcile.download.start",
            &format!("Downloading {}", desired.image_url),
            None,
        );
        let local = fetch::download(&self.client, &desired.image_url, &self.download_dir).await?;

        emit(
            Level::Debug,
            "reconcile.apply.start",
            &format!("Applying {} with {}", local.display(), self.applier.program()),
            None,
        );
        self.applier.apply_and_cleanup(&local).await?;

        let record = self.store.append(&desired.image_url, &desired.timestamp)?;
        Ok(TickOutcome::Applied(record))
    }

    /// Run a tick and report its outcome. Returns whether the tick succeeded.
    pub async fn tick_and_report(&mut self) -> bool {
        match self.tick().await {
            Ok(TickOutcome::Applied(record)) => {
                emit(
                    Level::Success,
                    "reconcile.tick.applied",
                    &format!("Wallpaper changed to {}", record.image_url),
                    Some(serde_json::json!({
                        "id": record.id,
                        "image_url": record.image_url,
                        "timestamp": record.timestamp,
                        "applied_at": record.applied_at,
                    })),
                );
                true
            }
            Ok(TickOutcome::Unchanged(record)) => {
                emit(
                    Level::Info,
                    "reconcile.tick.unchanged",
                    "No wallpaper change needed",
                    Some(serde_json::json!({
                        "image_url": record.image_url,
                        "timestamp": record.timestamp,
                    })),
                );
                true
            }
            Err(e) => {
                emit(
                    Level::Error,
                    &format!("reconcile.tick.failed.{}", e.kind()),
                    &format!("Wallpaper check failed: {}", e),
                    Some(serde_json::json!({ "kind": e.kind() })),
                );
                false
            }
        }
    }
}
