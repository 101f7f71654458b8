//! Hosting provider integration
//!
//! A provider owns every game server rented under one account. Concrete
//! providers are split in two halves:
//!
//! - a [`ProviderApi`]: stateless request/response mapping of the remote REST API
//! - a [`ServerProvider`]: the stateful side used by the rest of the relay
//!   (poll loop, published snapshot, backups, command forwarding)
//!
//! [`hosted::HostedProvider`] implements the stateful half generically on top
//! of any [`ProviderApi`], so a new provider type only needs its API client
//! and an entry in the [`registry::ProviderRegistry`].

pub mod hosted;
pub mod nitrado;
pub mod polling;
pub mod registry;
pub mod types;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::backup::BackupDescription;
use types::{ServerEntry, ServerRecord, ServerStatus, ServiceSummary};

pub use hosted::HostedProvider;
pub use polling::{ChangeEvent, PollingEngine};
pub use registry::ProviderRegistry;

/// Remote REST API of a hosting provider
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// Every service rented under the account
    async fn list_services(&self) -> anyhow::Result<Vec<ServiceSummary>>;

    /// Detailed state and credentials of one service
    async fn fetch_server(&self, service: &ServiceSummary) -> anyhow::Result<ServerRecord>;

    async fn start_server(&self, server_id: &str) -> anyhow::Result<()>;

    async fn stop_server(&self, server_id: &str) -> anyhow::Result<()>;

    async fn restart_server(&self, server_id: &str) -> anyhow::Result<()>;
}

/// Control surface of a provider, addressed by server id
///
/// Commands report plain success; failures are logged by the provider.
#[async_trait]
pub trait ServerProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Servers of the currently published snapshot
    fn servers(&self) -> Vec<ServerEntry>;

    /// Best known status, `None` when the id is not in the snapshot
    fn status(&self, server_id: &str) -> Option<ServerStatus>;

    async fn start(&self, server_id: &str) -> bool;

    async fn stop(&self, server_id: &str) -> bool;

    async fn restart(&self, server_id: &str) -> bool;

    async fn create_backup(&self, server_id: &str) -> bool;

    async fn restore_backup(&self, server_id: &str, archive: &Path) -> bool;

    /// Archives of the server, oldest first
    fn list_backups(&self, server_id: &str) -> Vec<BackupDescription>;

    /// Waits for the first published snapshot; `false` on timeout
    async fn wait_until_ready(&self, timeout: Duration) -> bool;

    /// Stops background polling
    fn shutdown(&self);
}
