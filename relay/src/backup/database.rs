use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::DatabaseTool;
use crate::provider::types::DatabaseCredentials;

/// [`DatabaseTool`] backed by the `mysqldump` and `mysql` command line clients
///
/// The password goes through `MYSQL_PWD` so it never shows up in the process list.
pub struct MysqlTool {
    dump_command: String,
    client_command: String,
}

impl Default for MysqlTool {
    fn default() -> Self {
        Self {
            dump_command: "mysqldump".to_string(),
            client_command: "mysql".to_string(),
        }
    }
}

impl MysqlTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom client binaries, e.g. `mariadb-dump`
    pub fn with_commands(dump_command: &str, client_command: &str) -> Self {
        Self {
            dump_command: dump_command.to_string(),
            client_command: client_command.to_string(),
        }
    }

    fn command(program: &str, credentials: &DatabaseCredentials) -> Command {
        let mut command = Command::new(program);
        command
            .arg(format!("--host={}", credentials.hostname))
            .arg(format!("--port={}", credentials.port))
            .arg(format!("--user={}", credentials.username))
            .arg(&credentials.database)
            .env("MYSQL_PWD", &credentials.password)
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl DatabaseTool for MysqlTool {
    async fn dump(&self, credentials: &DatabaseCredentials, target: &Path) -> Result<bool> {
        let output = match Self::command(&self.dump_command, credentials)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "No {} is available in the system, database '{}' is not backed up",
                    self.dump_command, credentials.database
                );
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            return Err(anyhow!(
                "{} of '{}' exited with {}: {}",
                self.dump_command,
                credentials.database,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, &output.stdout).await?;

        debug!(
            "Dumped database '{}' ({} bytes) to {}",
            credentials.database,
            output.stdout.len(),
            target.display()
        );
        Ok(true)
    }

    async fn replay(&self, credentials: &DatabaseCredentials, source: &Path) -> Result<bool> {
        let input = std::fs::File::open(source)?;

        let output = match Self::command(&self.client_command, credentials)
            .stdin(Stdio::from(input))
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "No {} is available in the system, database '{}' is not restored",
                    self.client_command, credentials.database
                );
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            return Err(anyhow!(
                "{} replay into '{}' exited with {}: {}",
                self.client_command,
                credentials.database,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        debug!("Replayed {} into database '{}'", source.display(), credentials.database);
        Ok(true)
    }
}
