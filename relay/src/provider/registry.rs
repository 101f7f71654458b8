// File: relay/src/provider/registry.rs
//! Type tag → constructor map and owner of every running provider

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::ServerProvider;
use crate::config::ProviderConfiguration;
use crate::constants::nitrado;
use crate::errors::{ConfigError, ProviderError, RelayError};
use crate::game_server::GameServer;
use crate::notification::Notifier;

pub type ProviderFuture = BoxFuture<'static, anyhow::Result<Arc<dyn ServerProvider>>>;

/// Builds a provider and starts its poll loop; readiness is awaited by the registry
pub type ProviderConstructor =
    fn(ProviderConfiguration, PathBuf, Arc<dyn Notifier>) -> ProviderFuture;

const KIND: &str = "server provider";

pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
    providers: Vec<Arc<dyn ServerProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(nitrado::TYPE_TAG, super::nitrado::create);
        registry
    }
}

impl ProviderRegistry {
    /// Registry knowing every built-in provider type
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without any provider type
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            providers: Vec::new(),
        }
    }

    pub fn register(&mut self, type_tag: &str, constructor: ProviderConstructor) {
        self.constructors.insert(type_tag.to_string(), constructor);
    }

    pub fn is_supported(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    /// Rejects the whole list before anything is constructed
    pub fn validate(&self, configs: &[ProviderConfiguration]) -> Result<(), ConfigError> {
        if configs.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "server_providers".to_string(),
            });
        }

        for config in configs {
            if config.provider_type.is_empty() {
                return Err(ConfigError::EmptyType {
                    kind: KIND.to_string(),
                });
            }
            if !self.is_supported(&config.provider_type) {
                return Err(ConfigError::UnknownType {
                    kind: KIND.to_string(),
                    type_name: config.provider_type.clone(),
                });
            }
            if config.token.is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: format!("server_providers.token ({})", config.provider_type),
                });
            }
        }

        Ok(())
    }

    /// Constructs every configured provider and waits for its first snapshot
    ///
    /// On any failure the providers started so far are shut down again.
    pub async fn create_all(
        &mut self,
        configs: &[ProviderConfiguration],
        backups_folder: &Path,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(), RelayError> {
        self.validate(configs)?;

        for config in configs {
            match self.create(config, backups_folder, notifier.clone()).await {
                Ok(provider) => self.providers.push(provider),
                Err(e) => {
                    error!("Failed to start {} provider: {}", config.provider_type, e);
                    self.shutdown();
                    self.providers.clear();
                    return Err(e);
                }
            }
        }

        info!(
            "{} providers ready with {} game servers",
            self.providers.len(),
            self.game_servers().len()
        );
        Ok(())
    }

    async fn create(
        &self,
        config: &ProviderConfiguration,
        backups_folder: &Path,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<dyn ServerProvider>, RelayError> {
        let constructor = self.constructors.get(&config.provider_type).ok_or_else(|| {
            ConfigError::UnknownType {
                kind: KIND.to_string(),
                type_name: config.provider_type.clone(),
            }
        })?;

        let provider = constructor(config.clone(), backups_folder.to_path_buf(), notifier).await?;

        let timeout = Duration::from_secs(config.startup_timeout_seconds);
        if !provider.wait_until_ready(timeout).await {
            provider.shutdown();
            return Err(ProviderError::StartupTimeout {
                provider: provider.name().to_string(),
                seconds: config.startup_timeout_seconds,
            }
            .into());
        }

        info!("{} provider reports {} servers", provider.name(), provider.servers().len());
        Ok(provider)
    }

    pub fn providers(&self) -> &[Arc<dyn ServerProvider>] {
        &self.providers
    }

    /// Facades of every server of every provider
    pub fn game_servers(&self) -> Vec<GameServer> {
        self.providers
            .iter()
            .flat_map(|provider| {
                provider
                    .servers()
                    .into_iter()
                    .map(move |entry| GameServer::new(provider.clone(), &entry.id, &entry.name))
            })
            .collect()
    }

    pub fn shutdown(&self) {
        for provider in &self.providers {
            provider.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupDescription;
    use crate::notification::NotificationHub;
    use crate::provider::types::{ServerEntry, ServerStatus};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StaticProvider {
        ready: bool,
        stopped: AtomicBool,
    }

    #[async_trait]
    impl ServerProvider for StaticProvider {
        fn name(&self) -> &str {
            "Static"
        }

        fn servers(&self) -> Vec<ServerEntry> {
            vec![
                ServerEntry { id: "1".to_string(), name: "arkse-10.0.0.1:7777".to_string() },
                ServerEntry { id: "2".to_string(), name: "arkse-10.0.0.2:7777".to_string() },
            ]
        }

        fn status(&self, _server_id: &str) -> Option<ServerStatus> {
            None
        }

        async fn start(&self, _server_id: &str) -> bool {
            true
        }

        async fn stop(&self, _server_id: &str) -> bool {
            true
        }

        async fn restart(&self, _server_id: &str) -> bool {
            true
        }

        async fn create_backup(&self, _server_id: &str) -> bool {
            true
        }

        async fn restore_backup(&self, _server_id: &str, _archive: &Path) -> bool {
            true
        }

        fn list_backups(&self, _server_id: &str) -> Vec<BackupDescription> {
            Vec::new()
        }

        async fn wait_until_ready(&self, _timeout: Duration) -> bool {
            self.ready
        }

        fn shutdown(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    fn ready_provider(_: ProviderConfiguration, _: PathBuf, _: Arc<dyn Notifier>) -> ProviderFuture {
        Box::pin(async {
            let provider: Arc<dyn ServerProvider> = Arc::new(StaticProvider {
                ready: true,
                stopped: AtomicBool::new(false),
            });
            Ok(provider)
        })
    }

    fn silent_provider(_: ProviderConfiguration, _: PathBuf, _: Arc<dyn Notifier>) -> ProviderFuture {
        Box::pin(async {
            let provider: Arc<dyn ServerProvider> = Arc::new(StaticProvider {
                ready: false,
                stopped: AtomicBool::new(false),
            });
            Ok(provider)
        })
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::empty();
        registry.register("static", ready_provider);
        registry.register("silent", silent_provider);
        registry
    }

    #[rstest]
    #[case("", "secret", "Empty server provider type provided")]
    #[case("steam", "secret", "Unknown server provider type provided: 'steam'")]
    #[case("static", "", "Missing required field")]
    fn test_invalid_configuration_is_rejected(
        #[case] provider_type: &str,
        #[case] token: &str,
        #[case] message: &str,
    ) {
        let configs = vec![ProviderConfiguration::new(provider_type, token)];

        let err = registry().validate(&configs).unwrap_err();
        assert!(err.to_string().contains(message), "{}", err);
    }

    #[test]
    fn test_empty_provider_list_is_rejected() {
        assert!(matches!(
            registry().validate(&[]),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn test_nitrado_is_built_in() {
        assert!(ProviderRegistry::new().is_supported("nitrado"));
        assert!(!ProviderRegistry::empty().is_supported("nitrado"));
    }

    #[tokio::test]
    async fn test_create_all_flattens_game_servers() {
        let mut registry = registry();
        let configs = vec![
            ProviderConfiguration::new("static", "a"),
            ProviderConfiguration::new("static", "b"),
        ];

        registry
            .create_all(&configs, Path::new("/tmp/backups"), Arc::new(NotificationHub::new()))
            .await
            .unwrap();

        let servers = registry.game_servers();
        assert_eq!(servers.len(), 4);
        assert_eq!(servers[0].name(), "arkse-10.0.0.1:7777");
        assert_eq!(servers[1].server_id(), "2");
    }

    #[tokio::test]
    async fn test_startup_timeout_is_fatal() {
        let mut registry = registry();
        let mut config = ProviderConfiguration::new("silent", "a");
        config.startup_timeout_seconds = 0;

        let err = registry
            .create_all(
                &[ProviderConfiguration::new("static", "a"), config],
                Path::new("/tmp/backups"),
                Arc::new(NotificationHub::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RelayError::Provider(ProviderError::StartupTimeout { .. })
        ));
        assert!(registry.providers().is_empty());
    }
}
