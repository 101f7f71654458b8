use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::Notifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub title: String,
    pub message: String,
}

/// Mailbox of messages waiting to be delivered by one chat adapter
#[derive(Debug, Default)]
pub struct NotificationSink {
    queue: Mutex<Vec<NotificationMessage>>,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, title: &str, message: &str) {
        self.lock().push(NotificationMessage {
            title: title.to_string(),
            message: message.to_string(),
        });
        debug!("Queued notification '{}'", title);
    }

    /// Empties the queue, returning everything posted since the previous drain
    pub fn drain(&self) -> Vec<NotificationMessage> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a half-pushed Vec behind
    fn lock(&self) -> MutexGuard<'_, Vec<NotificationMessage>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for NotificationSink {
    fn notify(&self, title: &str, message: &str) {
        self.post(title, message);
    }
}
