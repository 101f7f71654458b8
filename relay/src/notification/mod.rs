//! Outbound notification plumbing
//!
//! Providers only see the [`Notifier`] trait. The [`NotificationHub`] passed to
//! them copies every event into the private [`NotificationSink`] of each chat
//! adapter, so every adapter drains its own queue and sees every message.

mod hub;
mod sink;

pub use hub::NotificationHub;
pub use sink::{NotificationMessage, NotificationSink};

/// Receiver of (title, message) events raised by providers
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}
