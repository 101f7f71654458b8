use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{forward_notifications, ChatBot};
use crate::config::BotConfiguration;
use crate::constants::bots::DISCORD_API_URL;
use crate::constants::http::CONNECT_TIMEOUT;
use crate::notification::{NotificationMessage, NotificationSink};

/// Discord adapter forwarding provider notifications to text channels
pub struct DiscordBot {
    client: Client,
    api_url: String,
    token: String,
    channels: Vec<String>,
    interval: Duration,
    sink: Arc<NotificationSink>,
}

impl DiscordBot {
    pub fn new(config: &BotConfiguration, sink: Arc<NotificationSink>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        if config.allowed_channels.is_empty() {
            warn!("Discord bot has no allowed channels, notifications will be dropped");
        }

        Ok(Self {
            client,
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DISCORD_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: config.token.clone(),
            channels: config.allowed_channels.clone(),
            interval: Duration::from_secs(config.notify_polling_seconds.max(1)),
            sink,
        })
    }

    /// Posts one message to one channel
    pub async fn send(&self, channel: &str, content: &str) -> Result<()> {
        let url = format!("{}/channels/{}/messages", self.api_url, channel);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(|e| anyhow!("Discord request to channel {} failed: {}", channel, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Discord rejected message to channel {} with status {}: {}",
                channel,
                status,
                error_text
            ));
        }

        debug!("Discord message delivered to channel {}", channel);
        Ok(())
    }

    async fn broadcast(&self, message: NotificationMessage) {
        let content = format!("**{}**\n{}", message.title, message.message);
        for channel in &self.channels {
            if let Err(e) = self.send(channel, &content).await {
                warn!("{}", e);
            }
        }
    }
}

#[async_trait]
impl ChatBot for DiscordBot {
    fn name(&self) -> &str {
        "discord"
    }

    fn notify(&self, title: &str, message: &str) {
        self.sink.post(title, message);
    }

    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Discord bot forwarding notifications to {} channels every {}s",
            self.channels.len(),
            self.interval.as_secs()
        );

        forward_notifications("discord", &self.sink, self.interval, shutdown, |message| {
            self.broadcast(message)
        })
        .await;

        info!("Discord bot stopped");
        Ok(())
    }
}
