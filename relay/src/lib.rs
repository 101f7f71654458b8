pub mod app;
pub mod backup;
pub mod bots;
pub mod config;
pub mod constants;
pub mod errors;
pub mod game_server;
pub mod notification;
pub mod operation_tracker;
pub mod provider;

// Re-export commonly used types
pub use app::Relay;
pub use backup::{BackupArchiver, BackupDescription};
pub use bots::{BotFactory, ChatBot};
pub use config::{ConfigManager, RelayConfiguration};
pub use errors::RelayError;
pub use game_server::GameServer;
pub use notification::{NotificationHub, Notifier};
pub use operation_tracker::OperationTracker;
pub use provider::{ProviderRegistry, ServerProvider};
