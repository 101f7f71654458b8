use std::sync::Arc;
use tracing::info;

use super::{ChatBot, DiscordBot, TelegramBot};
use crate::config::BotConfiguration;
use crate::constants::bots::{DISCORD_TYPE_TAG, TELEGRAM_TYPE_TAG};
use crate::errors::{ConfigError, RelayError};
use crate::game_server::GameServer;
use crate::notification::NotificationHub;

const KIND: &str = "bot";
const SUPPORTED: [&str; 2] = [DISCORD_TYPE_TAG, TELEGRAM_TYPE_TAG];

/// Builds chat adapters from configuration, each with its own notification sink
pub struct BotFactory;

impl BotFactory {
    pub fn validate(configs: &[BotConfiguration]) -> Result<(), ConfigError> {
        if configs.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "bots".to_string(),
            });
        }

        for config in configs {
            Self::validate_one(config)?;
        }
        Ok(())
    }

    fn validate_one(config: &BotConfiguration) -> Result<(), ConfigError> {
        if config.bot_type.is_empty() {
            return Err(ConfigError::EmptyType {
                kind: KIND.to_string(),
            });
        }
        if !SUPPORTED.contains(&config.bot_type.as_str()) {
            return Err(ConfigError::UnknownType {
                kind: KIND.to_string(),
                type_name: config.bot_type.clone(),
            });
        }
        if config.token.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: format!("bots.token ({})", config.bot_type),
            });
        }
        Ok(())
    }

    pub fn create(
        config: &BotConfiguration,
        game_servers: &[GameServer],
        hub: &NotificationHub,
    ) -> Result<Arc<dyn ChatBot>, RelayError> {
        Self::validate_one(config)?;

        let sink = hub.subscribe();
        let bot: Arc<dyn ChatBot> = match config.bot_type.as_str() {
            DISCORD_TYPE_TAG => Arc::new(DiscordBot::new(config, sink)?),
            TELEGRAM_TYPE_TAG => Arc::new(TelegramBot::new(config, game_servers.to_vec(), sink)?),
            other => {
                return Err(ConfigError::UnknownType {
                    kind: KIND.to_string(),
                    type_name: other.to_string(),
                }
                .into())
            }
        };

        info!("Created {} bot", bot.name());
        Ok(bot)
    }

    /// Validates the whole list first so nothing subscribes on a bad configuration
    pub fn create_all(
        configs: &[BotConfiguration],
        game_servers: &[GameServer],
        hub: &NotificationHub,
    ) -> Result<Vec<Arc<dyn ChatBot>>, RelayError> {
        Self::validate(configs)?;

        configs
            .iter()
            .map(|config| Self::create(config, game_servers, hub))
            .collect()
    }
}
