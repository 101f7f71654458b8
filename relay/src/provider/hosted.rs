// File: relay/src/provider/hosted.rs
//! Stateful provider built from a REST client, a poll loop and an archiver

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use super::polling::PollingEngine;
use super::types::{ServerEntry, ServerRecord, ServerStatus};
use super::{ProviderApi, ServerProvider};
use crate::backup::{BackupArchiver, BackupDescription};
use crate::config::NotificationToggles;
use crate::constants::restore::WAIT_STEP;
use crate::errors::{BackupError, ProviderError};
use crate::notification::Notifier;
use crate::operation_tracker::{OperationKind, OperationTracker};

pub struct HostedProvider {
    name: String,
    api: Arc<dyn ProviderApi>,
    engine: Arc<PollingEngine>,
    archiver: BackupArchiver,
    operations: OperationTracker,
    restore_timeout: Duration,
    wait_step: Duration,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl HostedProvider {
    pub fn new(
        name: &str,
        api: Arc<dyn ProviderApi>,
        archiver: BackupArchiver,
        toggles: NotificationToggles,
        notifier: Arc<dyn Notifier>,
        polling_interval: Duration,
        restore_timeout: Duration,
    ) -> Self {
        let engine = Arc::new(PollingEngine::new(
            name,
            api.clone(),
            toggles,
            notifier,
            polling_interval,
        ));

        Self {
            name: name.to_string(),
            api,
            engine,
            archiver,
            operations: OperationTracker::new(),
            restore_timeout,
            wait_step: WAIT_STEP,
            poll_task: Mutex::new(None),
        }
    }

    /// Overrides the interval between state checks while waiting for a server to stop
    pub fn with_wait_step(mut self, wait_step: Duration) -> Self {
        self.wait_step = wait_step;
        self
    }

    /// Spawns the poll loop; calling it again while running is a no-op
    pub fn start_polling(&self) {
        let mut task = self.poll_task.lock().unwrap_or_else(|p| p.into_inner());
        if task.is_none() {
            *task = Some(self.engine.spawn());
        }
    }

    pub fn engine(&self) -> &Arc<PollingEngine> {
        &self.engine
    }

    pub fn operations(&self) -> &OperationTracker {
        &self.operations
    }

    pub fn archiver(&self) -> &BackupArchiver {
        &self.archiver
    }

    fn record(&self, server_id: &str) -> Result<ServerRecord, ProviderError> {
        self.engine
            .record(server_id)
            .ok_or_else(|| ProviderError::UnknownServer {
                server_id: server_id.to_string(),
            })
    }

    /// Polls the published snapshot until the server reports `offline`
    async fn wait_for_offline(&self, server_id: &str) -> bool {
        let deadline = Instant::now() + self.restore_timeout;
        loop {
            if let Some(status) = self.engine.status(server_id) {
                if status.state.is_offline() {
                    return true;
                }
            }

            if Instant::now() + self.wait_step > deadline {
                return false;
            }
            tokio::time::sleep(self.wait_step).await;
        }
    }

    async fn backup(&self, server_id: &str) -> Result<BackupDescription> {
        let record = self.record(server_id)?;
        let _claim = self.operations.try_start(server_id, OperationKind::Backup)?;

        let backup = self.archiver.create_backup(&record).await?;
        info!(
            "Created backup '{}' of {} at {}",
            backup.readable_name,
            record.display_name(),
            backup.filepath.display()
        );
        Ok(backup)
    }

    #[instrument(skip(self, archive), fields(provider = %self.name, archive = %archive.display()))]
    async fn restore(&self, server_id: &str, archive: &Path) -> Result<()> {
        BackupArchiver::validate_archive(archive)?;
        let record = self.record(server_id)?;
        let _claim = self.operations.try_start(server_id, OperationKind::Restore)?;

        let started = Instant::now();
        self.restore_claimed(&record, archive).await?;
        info!(
            "Restoring {} took {}s",
            record.display_name(),
            started.elapsed().as_secs()
        );
        Ok(())
    }

    async fn restore_claimed(&self, record: &ServerRecord, archive: &Path) -> Result<()> {
        let was_running = !record.status.state.is_offline();

        if was_running {
            info!("Step 1: Stopping {}", record.display_name());
            self.api.stop_server(&record.id).await?;
        }

        info!("Step 2: Waiting for {} to go offline", record.display_name());
        if !self.wait_for_offline(&record.id).await {
            return Err(BackupError::StateTimeout {
                server_id: record.id.clone(),
                state: "offline".to_string(),
            }
            .into());
        }

        info!("Step 3: Uploading backup to {}", record.display_name());
        self.archiver
            .restore_files(record, archive)
            .await
            .map_err(|e| BackupError::TransferFailed {
                server_id: record.id.clone(),
                reason: format!("{:#}", e),
            })?;

        if was_running {
            info!("Step 4: Starting {} again", record.display_name());
            self.api.start_server(&record.id).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ServerProvider for HostedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn servers(&self) -> Vec<ServerEntry> {
        self.engine
            .snapshot()
            .map(|snapshot| {
                snapshot
                    .values()
                    .map(|record| ServerEntry {
                        id: record.id.clone(),
                        name: record.display_name(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn status(&self, server_id: &str) -> Option<ServerStatus> {
        self.engine.status(server_id)
    }

    async fn start(&self, server_id: &str) -> bool {
        match self.api.start_server(server_id).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}: failed to start {}: {:#}", self.name, server_id, e);
                false
            }
        }
    }

    async fn stop(&self, server_id: &str) -> bool {
        match self.api.stop_server(server_id).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}: failed to stop {}: {:#}", self.name, server_id, e);
                false
            }
        }
    }

    async fn restart(&self, server_id: &str) -> bool {
        match self.api.restart_server(server_id).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}: failed to restart {}: {:#}", self.name, server_id, e);
                false
            }
        }
    }

    async fn create_backup(&self, server_id: &str) -> bool {
        match self.backup(server_id).await {
            Ok(_) => true,
            Err(e) => {
                error!("{}: backup of {} failed: {:#}", self.name, server_id, e);
                false
            }
        }
    }

    async fn restore_backup(&self, server_id: &str, archive: &Path) -> bool {
        match self.restore(server_id, archive).await {
            Ok(()) => true,
            Err(e) => {
                error!("{}: restore of {} failed: {:#}", self.name, server_id, e);
                false
            }
        }
    }

    fn list_backups(&self, server_id: &str) -> Vec<BackupDescription> {
        match self.engine.record(server_id) {
            Some(record) => self.archiver.list_backups(&record.short_name, server_id),
            None => {
                warn!("{}: no backups listed for unknown server {}", self.name, server_id);
                Vec::new()
            }
        }
    }

    async fn wait_until_ready(&self, timeout: Duration) -> bool {
        self.engine.wait_until_ready(timeout).await
    }

    fn shutdown(&self) {
        // The loop exits at its next cycle boundary, in-flight requests finish first
        self.engine.stop();
        self.poll_task.lock().unwrap_or_else(|p| p.into_inner()).take();
        info!("{} provider shut down", self.name);
    }
}
