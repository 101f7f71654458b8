// File: relay/src/backup/archiver.rs
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{BackupDescription, DatabaseTool, FileTransfer};
use crate::constants::backup::{
    ARCHIVE_EXTENSION, DATABASE_FOLDER, FILENAME_TIMESTAMP_FORMAT, FILES_FOLDER,
    READABLE_TIMESTAMP_FORMAT,
};
use crate::errors::BackupError;
use crate::provider::types::ServerRecord;

/// Creates, lists and unpacks backup archives of one provider
pub struct BackupArchiver {
    /// `<backups folder>/<provider name lowercase>`
    root: PathBuf,
    transfer: Arc<dyn FileTransfer>,
    database: Arc<dyn DatabaseTool>,
    ignore_folders: Vec<String>,
}

impl BackupArchiver {
    pub fn new(
        backups_folder: &Path,
        provider_name: &str,
        transfer: Arc<dyn FileTransfer>,
        database: Arc<dyn DatabaseTool>,
        ignore_folders: Vec<String>,
    ) -> Self {
        Self {
            root: backups_folder.join(provider_name.to_lowercase()),
            transfer,
            database,
            ignore_folders,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding every archive of one server
    pub fn backup_directory(&self, short_name: &str, server_id: &str) -> PathBuf {
        self.root.join(short_name).join(server_id)
    }

    /// Mirrors the server's files and database into a fresh timestamped archive
    pub async fn create_backup(&self, record: &ServerRecord) -> Result<BackupDescription> {
        let created_at = Local::now().naive_local();
        let directory = self.backup_directory(&record.short_name, &record.id);
        tokio::fs::create_dir_all(&directory)
            .await
            .with_context(|| format!("Cannot create backup folder {}", directory.display()))?;

        let archive_path = directory.join(format!(
            "{}.{}",
            created_at.format(FILENAME_TIMESTAMP_FORMAT),
            ARCHIVE_EXTENSION
        ));

        let staging = TempDir::new()?;
        let files_root = staging.path().join(FILES_FOLDER);
        tokio::fs::create_dir_all(&files_root).await?;

        info!("Step 1: Downloading files of {}", record.display_name());
        let files = self
            .transfer
            .download_tree(&record.ftp, &files_root, &self.ignore_folders)
            .await?;

        if let Some(database) = &record.database {
            info!("Step 2: Dumping database '{}'", database.database);
            let dump_path = staging
                .path()
                .join(DATABASE_FOLDER)
                .join(format!("{}.sql", database.database));
            if !self.database.dump(database, &dump_path).await? {
                warn!("Backup of {} will not contain a database dump", record.display_name());
            }
        } else {
            debug!("Step 2: {} has no database, skipping dump", record.display_name());
        }

        info!("Step 3: Packing {} files into {}", files, archive_path.display());
        let source = staging.path().to_path_buf();
        let target = archive_path.clone();
        tokio::task::spawn_blocking(move || zip_directory(&source, &target)).await??;

        Ok(BackupDescription {
            readable_name: created_at.format(READABLE_TIMESTAMP_FORMAT).to_string(),
            filepath: archive_path,
        })
    }

    /// Archives of one server, oldest first
    ///
    /// Files whose name does not end in a `<date>_<time>` stamp are skipped.
    /// A missing folder yields an empty list.
    pub fn list_backups(&self, short_name: &str, server_id: &str) -> Vec<BackupDescription> {
        let directory = self.backup_directory(short_name, server_id);
        let pattern = format!(
            "{}/*",
            glob::Pattern::escape(&directory.to_string_lossy())
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Invalid backup pattern {}: {}", pattern, e);
                return Vec::new();
            }
        };

        let mut backups: Vec<BackupDescription> = entries
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let readable_name = readable_name(&path)?;
                Some(BackupDescription {
                    readable_name,
                    filepath: path,
                })
            })
            .collect();

        backups.sort();
        backups
    }

    /// Fails unless `archive` exists and opens as a zip file
    pub fn validate_archive(archive: &Path) -> Result<(), BackupError> {
        if !archive.is_file() {
            return Err(BackupError::ArchiveNotFound {
                path: archive.display().to_string(),
            });
        }

        let file = File::open(archive).map_err(|e| BackupError::ArchiveUnreadable {
            path: archive.display().to_string(),
            reason: e.to_string(),
        })?;
        ZipArchive::new(file).map_err(|e| BackupError::ArchiveUnreadable {
            path: archive.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Pushes the archive's files and database dump back to the server
    ///
    /// The server is expected to be stopped already.
    pub async fn restore_files(&self, record: &ServerRecord, archive: &Path) -> Result<()> {
        let staging = TempDir::new()?;

        info!("Unpacking {}", archive.display());
        let source = archive.to_path_buf();
        let target = staging.path().to_path_buf();
        tokio::task::spawn_blocking(move || unzip_archive(&source, &target)).await??;

        let files_root = staging.path().join(FILES_FOLDER);
        if files_root.is_dir() {
            let files = self
                .transfer
                .upload_tree(&record.ftp, &files_root, &self.ignore_folders)
                .await?;
            info!("Restored {} files of {}", files, record.display_name());
        } else {
            warn!("{} contains no '{}' folder", archive.display(), FILES_FOLDER);
        }

        if let Some(database) = &record.database {
            let dump_path = staging
                .path()
                .join(DATABASE_FOLDER)
                .join(format!("{}.sql", database.database));
            if dump_path.is_file() {
                if self.database.replay(database, &dump_path).await? {
                    info!("Restored database '{}'", database.database);
                }
            } else {
                debug!("{} contains no dump of '{}'", archive.display(), database.database);
            }
        }

        Ok(())
    }
}

/// `20240115_143000.zip` → `2024-01-15 14:30:00`
///
/// Only the last two `_` separated tokens of the file stem are considered, so
/// prefixed names such as `ark_20240115_143000.zip` are accepted as well.
pub fn readable_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let mut tokens = stem.rsplit('_');
    let time = tokens.next()?;
    let date = tokens.next()?;

    let timestamp =
        NaiveDateTime::parse_from_str(&format!("{}_{}", date, time), FILENAME_TIMESTAMP_FORMAT)
            .ok()?;
    Some(timestamp.format(READABLE_TIMESTAMP_FORMAT).to_string())
}

/// Packs `source` into `archive_path`
///
/// The archive is written to a `.part` file in the same folder and only
/// renamed once complete; on failure the partial file is removed.
fn zip_directory(source: &Path, archive_path: &Path) -> Result<()> {
    let directory = archive_path
        .parent()
        .ok_or_else(|| anyhow!("Archive path {} has no parent", archive_path.display()))?;
    let partial = tempfile::Builder::new()
        .suffix(".part")
        .tempfile_in(directory)
        .with_context(|| format!("Cannot create archive in {}", directory.display()))?;

    let mut writer = ZipWriter::new(partial.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_entries(&mut writer, source, source, options)?;
    writer.finish()?;

    partial
        .persist(archive_path)
        .with_context(|| format!("Cannot move archive to {}", archive_path.display()))?;
    Ok(())
}

fn add_entries(
    writer: &mut ZipWriter<File>,
    root: &Path,
    directory: &Path,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut entries = std::fs::read_dir(directory)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let name = path
            .strip_prefix(root)?
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type()?.is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
            add_entries(writer, root, &path, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut input = File::open(&path)?;
            std::io::copy(&mut input, writer)?;
        }
    }

    Ok(())
}

fn unzip_archive(archive: &Path, target: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Cannot open archive {}", archive.display()))?;
    zip.extract(target)?;
    Ok(())
}
