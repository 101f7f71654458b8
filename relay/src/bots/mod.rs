//! Chat platform adapters
//!
//! Each adapter owns one [`NotificationSink`] subscribed to the provider
//! notification hub and forwards whatever accumulated there to its allowed
//! channels on its own timer. Adapters that accept commands route them through
//! the platform neutral [`CommandDispatcher`].

pub mod commands;
pub mod discord;
pub mod factory;
pub mod telegram;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::notification::{NotificationMessage, NotificationSink};

pub use commands::{Command, CommandDispatcher};
pub use discord::DiscordBot;
pub use factory::BotFactory;
pub use telegram::TelegramBot;

#[async_trait]
pub trait ChatBot: Send + Sync {
    fn name(&self) -> &str;

    /// Queues a message for every allowed channel
    fn notify(&self, title: &str, message: &str);

    /// Runs the platform loop until `shutdown` turns true
    async fn run(&self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()>;
}

/// Drains `sink` every `interval` and hands each message to `deliver`
///
/// Messages still queued when shutdown is requested are delivered once more
/// before returning.
pub async fn forward_notifications<F, Fut>(
    bot_name: &str,
    sink: &NotificationSink,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut deliver: F,
) where
    F: FnMut(NotificationMessage) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let stopping = *shutdown.borrow_and_update();

        let messages = sink.drain();
        if !messages.is_empty() {
            debug!("{}: forwarding {} notifications", bot_name, messages.len());
        }
        for message in messages {
            deliver(message).await;
        }

        if stopping {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
