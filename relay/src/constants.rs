// File: relay/src/constants.rs
//! Central repository for timeouts, intervals and default configuration values
//!
//! Organized by category so that every magic number used by the providers,
//! the archiver and the chat adapters has a single source of truth.

use std::time::Duration;

/// HTTP client constants
pub mod http {
    use super::Duration;

    /// Timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Long-poll timeout (seconds) used for Telegram `getUpdates`
    pub const UPDATES_LONG_POLL_SECONDS: u64 = 25;

    /// Pause after a failed `getUpdates` call before trying again
    pub const UPDATES_RETRY_DELAY: Duration = Duration::from_secs(5);
}

/// Nitrado API constants
pub mod nitrado {
    /// Provider name used for logging and the backup directory namespace
    pub const PROVIDER_NAME: &str = "Nitrado";

    /// Configuration type tag
    pub const TYPE_TAG: &str = "nitrado";

    /// Public API endpoint
    pub const DEFAULT_API_URL: &str = "https://api.nitrado.net";

    /// API version the client was written against; the trailing build number changes often
    pub const EXPECTED_API_VERSION: &str = "nitrapi-1471";
}

/// Restore state machine constants
pub mod restore {
    use super::Duration;

    /// Interval between status checks while waiting for a server to stop
    pub const WAIT_STEP: Duration = Duration::from_secs(1);
}

/// Backup archive constants
pub mod backup {
    /// Timestamp format embedded in archive file names
    pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Human readable timestamp format shown to users
    pub const READABLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Archive extension
    pub const ARCHIVE_EXTENSION: &str = "zip";

    /// Folder inside the archive holding the game server file tree
    pub const FILES_FOLDER: &str = "files";

    /// Folder inside the archive holding the database dump
    pub const DATABASE_FOLDER: &str = "mysql";
}

/// Default configuration values
pub mod defaults {
    /// Default provider request timeout in seconds
    pub const PROVIDER_TIMEOUT_SECONDS: u64 = 10;

    /// Default provider polling interval in seconds
    pub const PROVIDER_POLLING_SECONDS: u64 = 5;

    /// Default time to wait for a server to go offline during restore
    pub const RESTORE_TIMEOUT_SECONDS: u64 = 60;

    /// Default time to wait for the first provider snapshot on startup
    pub const STARTUP_TIMEOUT_SECONDS: u64 = 300;

    /// Default period for forwarding queued notifications to chat channels
    pub const NOTIFY_POLLING_SECONDS: u64 = 5;

    /// Default backup root folder, relative to the working folder
    pub const BACKUPS_FOLDER: &str = "backups";

    /// Configuration file name inside the working folder
    pub const CONFIG_FILE_NAME: &str = "relay.toml";

    /// Working folder used when none is given on the command line
    pub const WORKING_FOLDER: &str = ".";

    /// Remote folders never included in backups (crash dumps)
    pub const IGNORE_FOLDERS: [&str; 2] = ["Crashes", "CrashReportClient"];
}

/// Chat platform constants
pub mod bots {
    /// Discord REST endpoint
    pub const DISCORD_API_URL: &str = "https://discord.com/api/v10";

    /// Telegram Bot API endpoint
    pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

    /// Type tags
    pub const DISCORD_TYPE_TAG: &str = "discord";
    pub const TELEGRAM_TYPE_TAG: &str = "telegram";
}
