// File: relay/src/bots/telegram.rs
//! Telegram adapter: notifications plus chat commands over `getUpdates` long polling

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{forward_notifications, ChatBot, Command, CommandDispatcher};
use crate::config::BotConfiguration;
use crate::constants::bots::TELEGRAM_API_URL;
use crate::constants::http::{CONNECT_TIMEOUT, UPDATES_LONG_POLL_SECONDS, UPDATES_RETRY_DELAY};
use crate::game_server::GameServer;
use crate::notification::{NotificationMessage, NotificationSink};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

impl User {
    /// Names a privileged user may be configured by
    fn identities(&self) -> Vec<String> {
        let mut identities = vec![self.id.to_string()];
        if let Some(username) = &self.username {
            identities.push(username.clone());
            identities.push(format!("@{}", username));
        }
        identities
    }
}

pub struct TelegramBot {
    client: Client,
    api_url: String,
    channels: Vec<String>,
    interval: Duration,
    sink: Arc<NotificationSink>,
    dispatcher: CommandDispatcher,
}

impl TelegramBot {
    pub fn new(
        config: &BotConfiguration,
        game_servers: Vec<GameServer>,
        sink: Arc<NotificationSink>,
    ) -> Result<Self> {
        // Requests must outlive the long poll
        let client = Client::builder()
            .timeout(Duration::from_secs(UPDATES_LONG_POLL_SECONDS + 10))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        let base = config
            .api_url
            .clone()
            .unwrap_or_else(|| TELEGRAM_API_URL.to_string());

        Ok(Self {
            client,
            api_url: format!("{}/bot{}", base.trim_end_matches('/'), config.token),
            channels: config.allowed_channels.clone(),
            interval: Duration::from_secs(config.notify_polling_seconds.max(1)),
            sink,
            dispatcher: CommandDispatcher::new(game_servers, config.privileged_users.clone()),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_url, method))
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Telegram {} request failed: {}", method, e))?;

        let status = response.status();
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Telegram {} response ({}): {}", method, status, e))?;

        if !parsed.ok {
            return Err(anyhow!(
                "Telegram {} failed: {}",
                method,
                parsed.description.unwrap_or_else(|| status.to_string())
            ));
        }

        parsed
            .result
            .ok_or_else(|| anyhow!("Telegram {} returned no result", method))
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let _: Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        debug!("Telegram message delivered to chat {}", chat_id);
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64, timeout_seconds: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_seconds,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Offset that skips every update queued while the bot was offline
    async fn skip_pending_updates(&self) -> i64 {
        match self.get_updates(-1, 0).await {
            Ok(updates) => updates.last().map(|u| u.update_id + 1).unwrap_or(0),
            Err(e) => {
                warn!("Could not drop pending Telegram updates: {}", e);
                0
            }
        }
    }

    fn is_allowed_chat(&self, chat_id: i64) -> bool {
        self.channels.is_empty() || self.channels.contains(&chat_id.to_string())
    }

    /// Handles one incoming update, replying in the same chat
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let command = match Command::parse(text) {
            None => return,
            Some(command) => command,
        };

        let chat_id = message.chat.id.to_string();
        let identities = message
            .from
            .as_ref()
            .map(User::identities)
            .unwrap_or_default();

        if !self.is_allowed_chat(message.chat.id) {
            warn!(
                "Called '{}' by {:?} in not allowed chat {}",
                text, identities, chat_id
            );
            return;
        }

        let reply = match command {
            Err(usage) => usage,
            Ok(command) => {
                debug!("Called '{}' by {:?}", command.name(), identities);
                if self.dispatcher.is_privileged(&identities) || !command.is_privileged() {
                    if let Some(ack) = self.dispatcher.acknowledgement(&command) {
                        self.reply(&chat_id, &ack).await;
                    }
                }
                self.dispatcher.execute(&identities, &command).await
            }
        };

        self.reply(&chat_id, &reply).await;
    }

    async fn reply(&self, chat_id: &str, text: &str) {
        if let Err(e) = self.send_message(chat_id, text).await {
            error!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }

    async fn broadcast(&self, message: NotificationMessage) {
        let text = format!("{}\n{}", message.title, message.message);
        for channel in &self.channels {
            if let Err(e) = self.send_message(channel, &text).await {
                warn!("Failed to notify chat {}: {}", channel, e);
            }
        }
    }

    async fn command_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset = self.skip_pending_updates().await;
        info!(
            "Telegram bot accepting commands for {:?}",
            self.dispatcher.server_names()
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let updates = tokio::select! {
                updates = self.get_updates(offset, UPDATES_LONG_POLL_SECONDS) => updates,
                _ = shutdown.changed() => break,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    tokio::select! {
                        _ = tokio::time::sleep(UPDATES_RETRY_DELAY) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ChatBot for TelegramBot {
    fn name(&self) -> &str {
        "telegram"
    }

    fn notify(&self, title: &str, message: &str) {
        self.sink.post(title, message);
    }

    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Telegram bot forwarding notifications to {} chats every {}s",
            self.channels.len(),
            self.interval.as_secs()
        );

        let notifications =
            forward_notifications("telegram", &self.sink, self.interval, shutdown.clone(), |message| {
                self.broadcast(message)
            });
        tokio::join!(notifications, self.command_loop(shutdown));

        info!("Telegram bot stopped");
        Ok(())
    }
}
