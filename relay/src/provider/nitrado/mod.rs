//! Nitrado hosting provider

pub mod client;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::registry::ProviderFuture;
use super::{HostedProvider, ServerProvider};
use crate::backup::{BackupArchiver, FtpTransfer, MysqlTool};
use crate::config::ProviderConfiguration;
use crate::constants::nitrado::PROVIDER_NAME;
use crate::notification::Notifier;

pub use client::NitradoClient;

/// Registry constructor for the `nitrado` type tag
pub fn create(
    config: ProviderConfiguration,
    backups_folder: PathBuf,
    notifier: Arc<dyn Notifier>,
) -> ProviderFuture {
    Box::pin(async move {
        let provider: Arc<dyn ServerProvider> = connect(&config, &backups_folder, notifier).await?;
        Ok(provider)
    })
}

/// Checks the API, wires client, FTP and database tools together and starts polling
pub async fn connect(
    config: &ProviderConfiguration,
    backups_folder: &Path,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<HostedProvider>> {
    let timeout = Duration::from_secs(config.timeout_seconds.max(1));
    let client = NitradoClient::new(&config.api_url, &config.token, timeout)?;

    let version = client.verify_api_version().await?;
    info!("Connected to {} API {} at {}", PROVIDER_NAME, version, config.api_url);

    let archiver = BackupArchiver::new(
        backups_folder,
        PROVIDER_NAME,
        Arc::new(FtpTransfer::new(timeout)),
        Arc::new(MysqlTool::new()),
        config.ignore_folders.clone(),
    );

    let provider = HostedProvider::new(
        PROVIDER_NAME,
        Arc::new(client),
        archiver,
        config.notifications.clone(),
        notifier,
        Duration::from_secs(config.polling_seconds.max(1)),
        Duration::from_secs(config.restore_timeout_seconds),
    );
    provider.start_polling();

    Ok(Arc::new(provider))
}
