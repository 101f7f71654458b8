// File: relay/src/operation_tracker.rs
//! Tracks long-running backup and restore operations per server
//!
//! Only one operation may run against a server at a time: a restore uploading
//! files while a backup downloads them would produce a torn archive.
//!
//! The claim is held by an [`OperationGuard`] and released when it is dropped,
//! including when the future owning it is cancelled.
//!
//! ```ignore
//! let _guard = tracker.try_start("1234567", OperationKind::Backup)?;
//! // ... work ...
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument};

use crate::errors::BackupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Backup,
    Restore,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Backup => write!(f, "backup"),
            OperationKind::Restore => write!(f, "restore"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveOperation {
    pub kind: OperationKind,
    pub server_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct OperationTracker {
    active: Arc<Mutex<HashMap<String, ActiveOperation>>>, // server_id -> operation
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, HashMap<String, ActiveOperation>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Claims the server for `kind`; fails while another operation holds it
    #[instrument(skip(self), fields(server = %server_id, operation = %kind))]
    pub fn try_start(&self, server_id: &str, kind: OperationKind) -> Result<OperationGuard, BackupError> {
        let mut active = self.active();

        if let Some(current) = active.get(server_id) {
            return Err(BackupError::ServerBusy {
                server_id: server_id.to_string(),
                operation: current.kind.to_string(),
            });
        }

        active.insert(
            server_id.to_string(),
            ActiveOperation {
                kind,
                server_id: server_id.to_string(),
                started_at: Utc::now(),
            },
        );
        info!("Started {} of server {}", kind, server_id);

        Ok(OperationGuard {
            tracker: self.clone(),
            server_id: server_id.to_string(),
        })
    }

    fn finish(&self, server_id: &str) {
        if let Some(operation) = self.active().remove(server_id) {
            let duration = Utc::now().signed_duration_since(operation.started_at);
            info!(
                "Finished {} of server {} (took {}s)",
                operation.kind,
                server_id,
                duration.num_seconds()
            );
        }
    }

    pub fn is_busy(&self, server_id: &str) -> bool {
        self.active().contains_key(server_id)
    }

    pub fn active_operation(&self, server_id: &str) -> Option<ActiveOperation> {
        self.active().get(server_id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.active().len()
    }
}

/// Holds a server claimed by [`OperationTracker::try_start`] until dropped
#[must_use = "the server is released as soon as the guard is dropped"]
pub struct OperationGuard {
    tracker: OperationTracker,
    server_id: String,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.server_id);
    }
}
