// File: relay/src/app.rs
use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bots::{BotFactory, ChatBot};
use crate::config::ConfigManager;
use crate::notification::NotificationHub;
use crate::provider::ProviderRegistry;

/// A started relay: providers polling, bots built but not yet running
pub struct Relay {
    registry: ProviderRegistry,
    bots: Vec<Arc<dyn ChatBot>>,
    hub: Arc<NotificationHub>,
}

impl Relay {
    /// Loads `relay.toml` from `working_folder` and brings every component up
    pub async fn start(working_folder: impl AsRef<Path>) -> Result<Self> {
        info!("Step 1: Loading configuration");
        let config_manager = ConfigManager::new(working_folder).await?;
        let config = config_manager.get_current_config();

        BotFactory::validate(&config.bots)?;

        let backup_root = config_manager.backup_root();
        tokio::fs::create_dir_all(&backup_root).await?;
        info!("Step 2: Backups stored in {}", backup_root.display());

        let hub = Arc::new(NotificationHub::new());

        info!("Step 3: Connecting server providers");
        let mut registry = ProviderRegistry::new();
        registry
            .create_all(&config.server_providers, &backup_root, hub.clone())
            .await?;

        info!("Step 4: Creating bots");
        let bots = match BotFactory::create_all(&config.bots, &registry.game_servers(), &hub) {
            Ok(bots) => bots,
            Err(e) => {
                registry.shutdown();
                return Err(e.into());
            }
        };

        Ok(Self { registry, bots, hub })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn bots(&self) -> &[Arc<dyn ChatBot>] {
        &self.bots
    }

    pub fn hub(&self) -> Arc<NotificationHub> {
        self.hub.clone()
    }

    /// Runs every bot until `shutdown` resolves, then stops bots and providers
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (stop_tx, stop_rx) = watch::channel(false);

        let tasks: Vec<(String, JoinHandle<Result<()>>)> = self
            .bots
            .iter()
            .map(|bot| {
                let bot = bot.clone();
                let stop_rx = stop_rx.clone();
                (
                    bot.name().to_string(),
                    tokio::spawn(async move { bot.run(stop_rx).await }),
                )
            })
            .collect();

        info!("Relay running with {} bots", tasks.len());
        shutdown.await;

        info!("Shutting down");
        stop_tx.send_replace(true);

        for (name, task) in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("{} bot failed: {}", name, e),
                Err(e) => error!("{} bot task panicked: {}", name, e),
            }
        }

        self.registry.shutdown();
        info!("Relay stopped");
        Ok(())
    }
}

/// Starts the relay in `working_folder` and runs it until Ctrl-C
pub async fn run(working_folder: impl AsRef<Path>) -> Result<()> {
    let relay = Relay::start(working_folder).await?;

    relay
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
}
