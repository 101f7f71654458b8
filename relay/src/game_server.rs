//! Per-server handle handed to chat adapters

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::backup::BackupDescription;
use crate::provider::types::ServerStatus;
use crate::provider::ServerProvider;

/// Uniform control surface of one game server
///
/// Holds no state of its own; every call is forwarded to the owning provider
/// by server id, so clones can be shared freely between adapters.
#[derive(Clone)]
pub struct GameServer {
    provider: Arc<dyn ServerProvider>,
    server_id: String,
    name: String,
}

impl GameServer {
    pub fn new(provider: Arc<dyn ServerProvider>, server_id: &str, name: &str) -> Self {
        Self {
            provider,
            server_id: server_id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Best known status, at most one poll interval old
    pub fn status(&self) -> ServerStatus {
        self.provider
            .status(&self.server_id)
            .unwrap_or_else(ServerStatus::unknown)
    }

    pub async fn start(&self) -> bool {
        self.provider.start(&self.server_id).await
    }

    pub async fn stop(&self) -> bool {
        self.provider.stop(&self.server_id).await
    }

    pub async fn restart(&self) -> bool {
        self.provider.restart(&self.server_id).await
    }

    pub async fn create_backup(&self) -> bool {
        self.provider.create_backup(&self.server_id).await
    }

    pub async fn restore_backup(&self, archive: &Path) -> bool {
        self.provider.restore_backup(&self.server_id, archive).await
    }

    /// Oldest first; reverse for newest-first presentation
    pub fn list_backups(&self) -> Vec<BackupDescription> {
        self.provider.list_backups(&self.server_id)
    }
}

impl fmt::Debug for GameServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameServer")
            .field("provider", &self.provider.name())
            .field("server_id", &self.server_id)
            .field("name", &self.name)
            .finish()
    }
}
