//! Point-in-time backups of hosted game servers
//!
//! A backup is a zip archive holding the complete remote file tree (mirrored
//! over FTP) and, when the server has a database, a SQL dump of it.
//!
//! # Archive layout
//!
//! ```text
//! <root>/<provider>/<game short name>/<server id>/<YYYYmmdd_HHMMSS>.zip
//!   files/...            remote file tree, crash dump folders excluded
//!   mysql/<database>.sql optional database dump
//! ```
//!
//! # Restore Process
//!
//! 1. Verify the archive exists and can be opened
//! 2. Stop the server and wait until it reports `offline`
//! 3. Unpack the archive into a temporary directory
//! 4. Upload the file tree, creating remote directories as needed
//! 5. Replay the database dump when present
//! 6. Start the server again if it had been running
//!
//! Steps 2 and 6 need the provider API and live in the provider; this module
//! owns the filesystem, FTP and database parts.

pub mod archiver;
pub mod database;
pub mod ftp;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::provider::types::{DatabaseCredentials, FtpCredentials};

pub use archiver::BackupArchiver;
pub use database::MysqlTool;
pub use ftp::FtpTransfer;

/// One archive found on disk
///
/// Orders by `readable_name`, whose format makes lexicographic order chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BackupDescription {
    /// `YYYY-MM-DD HH:MM:SS`
    pub readable_name: String,
    pub filepath: PathBuf,
}

/// Mirrors a remote file tree to and from a local directory
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Downloads everything below the remote root into `local_root`; returns the file count
    async fn download_tree(
        &self,
        credentials: &FtpCredentials,
        local_root: &Path,
        ignore_folders: &[String],
    ) -> anyhow::Result<usize>;

    /// Uploads everything below `local_root` to the remote root; returns the file count
    async fn upload_tree(
        &self,
        credentials: &FtpCredentials,
        local_root: &Path,
        ignore_folders: &[String],
    ) -> anyhow::Result<usize>;
}

/// External database dump/replay
///
/// Both calls return `Ok(false)` when the required client tool is not installed.
#[async_trait]
pub trait DatabaseTool: Send + Sync {
    async fn dump(&self, credentials: &DatabaseCredentials, target: &Path) -> anyhow::Result<bool>;

    async fn replay(&self, credentials: &DatabaseCredentials, source: &Path) -> anyhow::Result<bool>;
}
