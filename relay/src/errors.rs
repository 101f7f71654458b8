// File: relay/src/errors.rs
//! Custom error types for the relay
//!
//! Structured errors for the failure scenarios that cross module boundaries.
//! Everything inside a module keeps using `anyhow` with context messages.

use std::fmt;

/// Main error type for the relay
#[derive(Debug)]
pub enum RelayError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Remote provider API errors
    Provider(ProviderError),

    /// Backup creation/restoration errors
    Backup(BackupError),

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Type tag was left empty
    EmptyType { kind: String },

    /// Type tag is not registered
    UnknownType { kind: String, type_name: String },
}

/// Provider API error variants
#[derive(Debug)]
pub enum ProviderError {
    /// Connection to the provider failed
    ConnectionFailed { url: String, reason: String },

    /// Provider answered with a non-success HTTP status
    BadStatus { url: String, status: u16 },

    /// Provider answered with something we could not parse
    InvalidResponse { url: String, reason: String },

    /// Provider did not publish a first snapshot in time
    StartupTimeout { provider: String, seconds: u64 },

    /// Server identifier is not part of the current snapshot
    UnknownServer { server_id: String },
}

/// Backup error variants
#[derive(Debug)]
pub enum BackupError {
    /// Archive path does not exist
    ArchiveNotFound { path: String },

    /// Archive exists but is not readable as an archive
    ArchiveUnreadable { path: String, reason: String },

    /// Another backup/restore is already running on the server
    ServerBusy { server_id: String, operation: String },

    /// Server did not reach the required state in time
    StateTimeout { server_id: String, state: String },

    /// File transfer failed
    TransferFailed { server_id: String, reason: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Config(e) => write!(f, "Configuration error: {}", e),
            RelayError::Provider(e) => write!(f, "Provider error: {}", e),
            RelayError::Backup(e) => write!(f, "Backup error: {}", e),
            RelayError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::EmptyType { kind } => {
                write!(f, "Empty {} type provided", kind)
            }
            ConfigError::UnknownType { kind, type_name } => {
                write!(f, "Unknown {} type provided: '{}'", kind, type_name)
            }
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::ConnectionFailed { url, reason } => {
                write!(f, "Request to {} failed: {}", url, reason)
            }
            ProviderError::BadStatus { url, status } => {
                write!(f, "Request to {} returned status {}", url, status)
            }
            ProviderError::InvalidResponse { url, reason } => {
                write!(f, "Invalid response from {}: {}", url, reason)
            }
            ProviderError::StartupTimeout { provider, seconds } => {
                write!(
                    f,
                    "Provider '{}' produced no server data within {}s",
                    provider, seconds
                )
            }
            ProviderError::UnknownServer { server_id } => {
                write!(f, "Server '{}' is not known to the provider", server_id)
            }
        }
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::ArchiveNotFound { path } => {
                write!(f, "Backup archive '{}' does not exist", path)
            }
            BackupError::ArchiveUnreadable { path, reason } => {
                write!(f, "Backup archive '{}' cannot be read: {}", path, reason)
            }
            BackupError::ServerBusy {
                server_id,
                operation,
            } => {
                write!(f, "Server '{}' is busy with: {}", server_id, operation)
            }
            BackupError::StateTimeout { server_id, state } => {
                write!(
                    f,
                    "Server '{}' did not become '{}' in time",
                    server_id, state
                )
            }
            BackupError::TransferFailed { server_id, reason } => {
                write!(f, "File transfer for '{}' failed: {}", server_id, reason)
            }
        }
    }
}

impl std::error::Error for RelayError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for BackupError {}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Other(err.to_string())
    }
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        RelayError::Config(err)
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        RelayError::Provider(err)
    }
}

impl From<BackupError> for RelayError {
    fn from(err: BackupError) -> Self {
        RelayError::Backup(err)
    }
}
