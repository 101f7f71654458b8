// File: relay/src/bots/commands.rs
//! Platform neutral chat command handling

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::game_server::GameServer;

const FAILURE_REPLY: &str = "Operation failed, please check the bot logs.";

/// A parsed chat command; `server` is the optional server name argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status { server: Option<String> },
    BackupList { server: Option<String> },
    Start { server: Option<String> },
    Stop { server: Option<String> },
    Restart { server: Option<String> },
    BackupCreate { server: Option<String> },
    /// `index` is 1-based in the newest-first order shown by `backup_list`
    BackupRestore { server: Option<String>, index: usize },
}

impl Command {
    /// Parses `/name[@bot] [args]`; `None` for plain text and unknown commands
    pub fn parse(text: &str) -> Option<Result<Command, String>> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head);
        let args: Vec<&str> = words.collect();
        let server = args.first().map(|s| s.to_string());

        let command = match name {
            "help" => Command::Help,
            "status" => Command::Status { server },
            "backup_list" => Command::BackupList { server },
            "start" => Command::Start { server },
            "stop" => Command::Stop { server },
            "restart" => Command::Restart { server },
            "backup_create" => Command::BackupCreate { server },
            "backup_restore" => {
                let (server, index) = match args.as_slice() {
                    [index] => (None, *index),
                    [server, index] => (Some(server.to_string()), *index),
                    _ => return Some(Err("Usage: /backup_restore [server] <backup #>".to_string())),
                };
                match index.parse::<usize>() {
                    Ok(index) if index > 0 => Command::BackupRestore { server, index },
                    _ => return Some(Err(format!("'{}' is not a backup number.", index))),
                }
            }
            _ => return None,
        };

        Some(Ok(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Status { .. } => "status",
            Command::BackupList { .. } => "backup_list",
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
            Command::Restart { .. } => "restart",
            Command::BackupCreate { .. } => "backup_create",
            Command::BackupRestore { .. } => "backup_restore",
        }
    }

    /// Commands that change server state require a privileged user
    pub fn is_privileged(&self) -> bool {
        !matches!(
            self,
            Command::Help | Command::Status { .. } | Command::BackupList { .. }
        )
    }

    fn server(&self) -> Option<&str> {
        match self {
            Command::Help => None,
            Command::Status { server }
            | Command::BackupList { server }
            | Command::Start { server }
            | Command::Stop { server }
            | Command::Restart { server }
            | Command::BackupCreate { server }
            | Command::BackupRestore { server, .. } => server.as_deref(),
        }
    }
}

/// Executes commands against the configured game servers
pub struct CommandDispatcher {
    game_servers: Vec<GameServer>,
    privileged_users: Vec<String>,
}

impl CommandDispatcher {
    pub fn new(game_servers: Vec<GameServer>, privileged_users: Vec<String>) -> Self {
        Self {
            game_servers,
            privileged_users,
        }
    }

    /// A user is identified by any of its platform identities (name, numeric id)
    pub fn is_privileged(&self, identities: &[String]) -> bool {
        identities
            .iter()
            .any(|identity| self.privileged_users.contains(identity))
    }

    /// Message sent before a long running command starts
    pub fn acknowledgement(&self, command: &Command) -> Option<String> {
        match command {
            Command::Start { .. } => Some("Starting server!".to_string()),
            Command::Stop { .. } => Some("Stopping server!".to_string()),
            Command::Restart { .. } => Some("Restarting server!".to_string()),
            Command::BackupCreate { .. } => {
                Some("Started creating backup, please wait.".to_string())
            }
            Command::BackupRestore { .. } => {
                Some("Started restoring backup, please wait.".to_string())
            }
            _ => None,
        }
    }

    /// Runs `command` on behalf of `identities` and returns the reply text
    pub async fn execute(&self, identities: &[String], command: &Command) -> String {
        if command.is_privileged() && !self.is_privileged(identities) {
            warn!(
                "Rejected '{}' from unprivileged user {:?}",
                command.name(),
                identities
            );
            return "Sorry but you don't have rights to call this command!".to_string();
        }

        if let Command::Help = command {
            return self.help();
        }

        let server = match self.select_server(command.server()) {
            Ok(server) => server,
            Err(reply) => return reply,
        };
        info!("{:?} called '{}' on {}", identities, command.name(), server.name());

        match command {
            Command::Help => self.help(),
            Command::Status { .. } => status_text(server),
            Command::BackupList { .. } => backup_list_text(server),
            Command::Start { .. } => outcome(server.start().await, "Server was started."),
            Command::Stop { .. } => outcome(server.stop().await, "Server was stopped."),
            Command::Restart { .. } => outcome(server.restart().await, "Server was restarted."),
            Command::BackupCreate { .. } => {
                outcome(server.create_backup().await, "Backup was created successfully!")
            }
            Command::BackupRestore { index, .. } => {
                let mut backups = server.list_backups();
                backups.reverse();
                match backups.get(index - 1) {
                    Some(backup) => outcome(
                        server.restore_backup(&backup.filepath).await,
                        &format!("Backup '{}' was restored successfully!", backup.readable_name),
                    ),
                    None => format!(
                        "There is no backup #{}, {} backups are available.",
                        index,
                        backups.len()
                    ),
                }
            }
        }
    }

    fn select_server(&self, name: Option<&str>) -> Result<&GameServer, String> {
        let server = match name {
            None => self.game_servers.first(),
            Some(name) => self.game_servers.iter().find(|server| server.name() == name),
        };

        server.ok_or_else(|| match name {
            None => "No game servers are available.".to_string(),
            Some(name) => format!(
                "Unknown server '{}'. Available: {}",
                name,
                self.server_names().join(", ")
            ),
        })
    }

    pub fn server_names(&self) -> Vec<String> {
        self.game_servers
            .iter()
            .map(|server| server.name().to_string())
            .collect()
    }

    fn help(&self) -> String {
        let mut text = String::from(
            "Commands (optional [server] defaults to the first one):\n\
             /status [server]\n\
             /backup_list [server]\n\
             /start [server]\n\
             /stop [server]\n\
             /restart [server]\n\
             /backup_create [server]\n\
             /backup_restore [server] <backup #>\n\nServers:",
        );
        for name in self.server_names() {
            text.push_str(&format!("\n- {}", name));
        }
        text
    }
}

fn outcome(success: bool, message: &str) -> String {
    if success {
        message.to_string()
    } else {
        FAILURE_REPLY.to_string()
    }
}

fn status_text(server: &GameServer) -> String {
    let status = server.status();

    let mut players = format!("{} / {}", status.players_connected, status.players_limit);
    if !status.player_names.is_empty() {
        players.push_str(&format!(" ({})", status.player_names.join(", ")));
    }

    let mut available_until = status.available_until.clone();
    if let Some(days) = days_left(&status.available_until) {
        available_until.push_str(&format!(" ({} days left)", days));
    }

    format!(
        "{}\n\nAddress: {}\nStatus: {}\nPlayers: {}\nAvailable until: {}\nUpdate available: {}",
        status.title(),
        status.address,
        status.state,
        players,
        available_until,
        if status.update_available { "yes" } else { "no" }
    )
}

fn backup_list_text(server: &GameServer) -> String {
    let backups = server.list_backups();
    if backups.is_empty() {
        return "No backups available.".to_string();
    }

    let mut text = String::from("Available backups:");
    for (number, backup) in backups.iter().rev().enumerate() {
        text.push_str(&format!("\n{}. {}", number + 1, backup.readable_name));
    }
    text
}

/// Days between today and the date part of `YYYY-MM-DD HH:MM:SS`
fn days_left(available_until: &str) -> Option<i64> {
    let date = available_until.split_whitespace().next()?;
    let until = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((until - Local::now().date_naive()).num_days())
}
