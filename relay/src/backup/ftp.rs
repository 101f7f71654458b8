// File: relay/src/backup/ftp.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::io::Read;
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use suppaftp::list::File as ListEntry;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::{debug, info, warn};

use super::FileTransfer;
use crate::provider::types::FtpCredentials;

/// Plain FTP implementation of [`FileTransfer`]
///
/// suppaftp is blocking, so every transfer runs on the blocking thread pool.
pub struct FtpTransfer {
    timeout: Duration,
}

impl FtpTransfer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn connect(credentials: &FtpCredentials, timeout: Duration) -> Result<FtpStream> {
        let address = (credentials.hostname.as_str(), credentials.port)
            .to_socket_addrs()
            .with_context(|| format!("Cannot resolve FTP host {}", credentials.hostname))?
            .next()
            .ok_or_else(|| anyhow!("FTP host {} has no address", credentials.hostname))?;

        let mut ftp = FtpStream::connect_timeout(address, timeout)
            .map_err(|e| anyhow!("FTP connection to {} failed: {}", address, e))?;
        ftp.get_ref().set_read_timeout(Some(timeout))?;

        ftp.login(credentials.username.as_str(), credentials.password.as_str())
            .map_err(|e| anyhow!("FTP login as {} failed: {}", credentials.username, e))?;
        ftp.transfer_type(FileType::Binary)?;

        debug!("Connected to FTP {} as {}", address, credentials.username);
        Ok(ftp)
    }
}

#[async_trait]
impl FileTransfer for FtpTransfer {
    async fn download_tree(
        &self,
        credentials: &FtpCredentials,
        local_root: &Path,
        ignore_folders: &[String],
    ) -> Result<usize> {
        let credentials = credentials.clone();
        let local_root = local_root.to_path_buf();
        let ignore_folders = ignore_folders.to_vec();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let mut ftp = Self::connect(&credentials, timeout)?;
            let mut count = 0;
            download_dir(&mut ftp, ".", &local_root, &ignore_folders, &mut count)?;
            if let Err(e) = ftp.quit() {
                warn!("FTP quit failed: {}", e);
            }
            info!("Downloaded {} files from {}", count, credentials.hostname);
            Ok(count)
        })
        .await?
    }

    async fn upload_tree(
        &self,
        credentials: &FtpCredentials,
        local_root: &Path,
        ignore_folders: &[String],
    ) -> Result<usize> {
        let credentials = credentials.clone();
        let local_root = local_root.to_path_buf();
        let ignore_folders = ignore_folders.to_vec();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let mut ftp = Self::connect(&credentials, timeout)?;
            let mut count = 0;
            upload_dir(&mut ftp, &local_root, ".", &ignore_folders, &mut count)?;
            if let Err(e) = ftp.quit() {
                warn!("FTP quit failed: {}", e);
            }
            info!("Uploaded {} files to {}", count, credentials.hostname);
            Ok(count)
        })
        .await?
    }
}

/// Joins remote path segments without a leading `./`
pub fn join_remote(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == "." {
        name.to_string()
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

fn local_path(root: &Path, remote_path: &str) -> PathBuf {
    remote_path
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |path, part| path.join(part))
}

/// Streams a data connection into `file` chunk by chunk
fn copy_to_file(reader: &mut dyn Read, file: &mut std::fs::File) -> Result<u64, FtpError> {
    std::io::copy(reader, file).map_err(FtpError::ConnectionError)
}

fn download_dir(
    ftp: &mut FtpStream,
    remote_dir: &str,
    local_root: &Path,
    ignore_folders: &[String],
    count: &mut usize,
) -> Result<()> {
    let listing = ftp
        .list(Some(remote_dir))
        .map_err(|e| anyhow!("FTP listing of '{}' failed: {}", remote_dir, e))?;

    for line in listing {
        let entry = match ListEntry::from_str(&line) {
            Ok(entry) => entry,
            Err(_) => {
                debug!("Skipping unparsable FTP listing line: {}", line);
                continue;
            }
        };

        let name = entry.name();
        if name == "." || name == ".." {
            continue;
        }

        let remote_path = join_remote(remote_dir, name);
        if entry.is_directory() {
            if ignore_folders.iter().any(|ignored| ignored == name) {
                debug!("Skipping ignored folder '{}'", remote_path);
                continue;
            }
            download_dir(ftp, &remote_path, local_root, ignore_folders, count)?;
        } else if entry.is_file() {
            let target = local_path(local_root, &remote_path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut file = std::fs::File::create(&target)
                .with_context(|| format!("Cannot create {}", target.display()))?;
            ftp.retr(&remote_path, |reader| copy_to_file(reader, &mut file))
                .map_err(|e| anyhow!("FTP download of '{}' failed: {}", remote_path, e))?;

            debug!("Downloaded '{}' to '{}'", remote_path, target.display());
            *count += 1;
        }
    }

    Ok(())
}

fn upload_dir(
    ftp: &mut FtpStream,
    local_dir: &Path,
    remote_dir: &str,
    ignore_folders: &[String],
    count: &mut usize,
) -> Result<()> {
    for entry in std::fs::read_dir(local_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let remote_path = join_remote(remote_dir, &name);

        if entry.file_type()?.is_dir() {
            if ignore_folders.contains(&name) {
                debug!("Skipping ignored folder '{}'", entry.path().display());
                continue;
            }

            // Already existing directories make MKD fail, which is fine
            if let Err(e) = ftp.mkdir(&remote_path) {
                debug!("MKD '{}': {}", remote_path, e);
            }
            upload_dir(ftp, &entry.path(), &remote_path, ignore_folders, count)?;
        } else {
            let mut file = std::fs::File::open(entry.path())?;
            ftp.put_file(&remote_path, &mut file)
                .map_err(|e| anyhow!("FTP upload of '{}' failed: {}", remote_path, e))?;

            debug!("Uploaded '{}' to '{}'", entry.path().display(), remote_path);
            *count += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_remote_drops_current_directory_prefix() {
        assert_eq!(join_remote(".", "ShooterGame"), "ShooterGame");
        assert_eq!(join_remote("", "ShooterGame"), "ShooterGame");
        assert_eq!(join_remote("ShooterGame/", "Saved"), "ShooterGame/Saved");
        assert_eq!(
            join_remote("ShooterGame/Saved", "Config"),
            "ShooterGame/Saved/Config"
        );
    }

    #[test]
    fn test_copy_to_file_streams_whole_payload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("TheIsland.ark");
        let payload = vec![7u8; 3 * 1024 * 1024 + 11];

        let mut file = std::fs::File::create(&target).unwrap();
        let copied = copy_to_file(&mut std::io::Cursor::new(payload.clone()), &mut file).unwrap();
        drop(file);

        assert_eq!(copied, payload.len() as u64);
        assert_eq!(std::fs::read(&target).unwrap(), payload);
    }

    #[test]
    fn test_local_path_maps_remote_segments() {
        let root = Path::new("/tmp/stage/files");
        assert_eq!(
            local_path(root, "ShooterGame/Saved/a.ark"),
            Path::new("/tmp/stage/files/ShooterGame/Saved/a.ark")
        );
    }
}
