use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use super::{NotificationSink, Notifier};

/// Broadcasts provider events into one sink per subscribed chat adapter
///
/// Providers are built before the adapters (adapters need the server list), so
/// sinks subscribe after the hub has already been handed to the providers.
#[derive(Default)]
pub struct NotificationHub {
    sinks: RwLock<Vec<Arc<NotificationSink>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh sink that will receive every future event
    pub fn subscribe(&self) -> Arc<NotificationSink> {
        let sink = Arc::new(NotificationSink::new());
        let mut sinks = self.sinks.write().unwrap_or_else(|p| p.into_inner());
        sinks.push(sink.clone());
        info!("Notification subscriber #{} registered", sinks.len());
        sink
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.read().unwrap_or_else(|p| p.into_inner()).len()
    }
}

impl Notifier for NotificationHub {
    fn notify(&self, title: &str, message: &str) {
        let sinks = self.sinks.read().unwrap_or_else(|p| p.into_inner());
        if sinks.is_empty() {
            debug!("No subscribers, dropping notification '{}': {}", title, message);
            return;
        }

        for sink in sinks.iter() {
            sink.post(title, message);
        }
    }
}
