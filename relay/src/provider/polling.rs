// File: relay/src/provider/polling.rs
//! Background polling and change detection
//!
//! One [`PollingEngine`] per provider refreshes the state of every server,
//! compares it with the previously published snapshot and raises
//! notifications for the configured transitions.
//!
//! # Snapshot publication
//!
//! The engine is the single writer of an `ArcSwapOption<ServerSnapshot>`.
//! A cycle builds a complete new map off to the side and publishes it with one
//! pointer swap, so readers never lock and never see a mixture of two cycles.
//! Nothing is published until the first cycle succeeds.
//!
//! # Cycle
//!
//! 1. List services (a failed listing skips the cycle)
//! 2. Fetch details of every service concurrently; failed fetches are omitted
//! 3. Diff against the previous snapshot (skipped on the very first cycle)
//! 4. Swap in the new snapshot and flag readiness
//! 5. Sleep for the poll interval or until stop is requested

use arc_swap::ArcSwapOption;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{ServerRecord, ServerSnapshot, ServerStatus};
use super::ProviderApi;
use crate::config::NotificationToggles;
use crate::notification::Notifier;

/// A notification produced by comparing two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub server_id: String,
    pub title: String,
    pub message: String,
}

pub struct PollingEngine {
    provider_name: String,
    api: Arc<dyn ProviderApi>,
    toggles: NotificationToggles,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    snapshot: ArcSwapOption<ServerSnapshot>,
    ready_tx: watch::Sender<bool>,
    stop_tx: watch::Sender<bool>,
}

impl PollingEngine {
    pub fn new(
        provider_name: &str,
        api: Arc<dyn ProviderApi>,
        toggles: NotificationToggles,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        let (ready_tx, _) = watch::channel(false);
        let (stop_tx, _) = watch::channel(false);

        Self {
            provider_name: provider_name.to_string(),
            api,
            toggles,
            notifier,
            interval,
            snapshot: ArcSwapOption::empty(),
            ready_tx,
            stop_tx,
        }
    }

    /// Starts the poll loop on its own task
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move { engine.run().await })
    }

    /// Poll loop; returns only after [`PollingEngine::stop`]
    pub async fn run(self: Arc<Self>) {
        let mut stop_rx = self.stop_tx.subscribe();
        info!(
            "{} polling started with {}s interval",
            self.provider_name,
            self.interval.as_secs()
        );

        let mut cycle = 0u64;
        loop {
            if *stop_rx.borrow_and_update() {
                break;
            }

            cycle += 1;
            if !self.poll_once().await {
                warn!("{} poll cycle #{} produced no snapshot", self.provider_name, cycle);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = stop_rx.changed() => {}
            }
        }

        info!("{} polling stopped after {} cycles", self.provider_name, cycle);
    }

    /// Requests the loop to exit at the next cycle boundary
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Runs a single refresh cycle and publishes the result
    ///
    /// Returns `false` when the service listing failed and nothing was published.
    pub async fn poll_once(&self) -> bool {
        let services = match self.api.list_services().await {
            Ok(services) => services,
            Err(e) => {
                error!("{}: failed to list services: {:#}", self.provider_name, e);
                return false;
            }
        };

        let fetches = services.iter().map(|service| self.api.fetch_server(service));
        let results = join_all(fetches).await;

        let mut servers = ServerSnapshot::new();
        for (service, result) in services.iter().zip(results) {
            match result {
                Ok(record) => {
                    servers.insert(record.id.clone(), record);
                }
                Err(e) => {
                    error!(
                        "{}: failed to refresh service {}: {:#}",
                        self.provider_name, service.id, e
                    );
                }
            }
        }

        if let Some(previous) = self.snapshot.load_full() {
            for event in detect_changes(&previous, &servers, &self.toggles) {
                info!("{} [{}]: {}", self.provider_name, event.server_id, event.message);
                self.notifier.notify(&event.title, &event.message);
            }
        }

        debug!("{}: publishing snapshot of {} servers", self.provider_name, servers.len());
        self.snapshot.store(Some(Arc::new(servers)));

        self.ready_tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });

        true
    }

    /// Currently published snapshot, `None` before the first successful cycle
    pub fn snapshot(&self) -> Option<Arc<ServerSnapshot>> {
        self.snapshot.load_full()
    }

    pub fn record(&self, server_id: &str) -> Option<ServerRecord> {
        self.snapshot()
            .and_then(|snapshot| snapshot.get(server_id).cloned())
    }

    pub fn status(&self, server_id: &str) -> Option<ServerStatus> {
        self.snapshot()
            .and_then(|snapshot| snapshot.get(server_id).map(|record| record.status.clone()))
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Waits for the first published snapshot; `false` on timeout
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let mut ready_rx = self.ready_tx.subscribe();
        let wait = async {
            loop {
                if *ready_rx.borrow_and_update() {
                    return true;
                }
                if ready_rx.changed().await.is_err() {
                    return false;
                }
            }
        };

        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }
}

/// Compares two snapshots and lists the notifications enabled by `toggles`
///
/// Every field is compared independently, so one server can produce several
/// events in the same cycle. Servers that disappeared produce no event.
pub fn detect_changes(
    previous: &ServerSnapshot,
    current: &ServerSnapshot,
    toggles: &NotificationToggles,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for (server_id, record) in current {
        let status = &record.status;
        let title = status.title();
        let mut push = |message: String| {
            events.push(ChangeEvent {
                server_id: server_id.clone(),
                title: title.clone(),
                message,
            })
        };

        let old = match previous.get(server_id) {
            Some(old) => &old.status,
            None => {
                if toggles.on_new_server {
                    push("New game server appeared, please configure it.".to_string());
                }
                continue;
            }
        };

        if toggles.on_status_change && status.state != old.state {
            push(format!(
                "Status changed from '{}' to '{}'.",
                old.state, status.state
            ));
        }

        if toggles.on_address_change && status.address != old.address {
            push(format!(
                "Address changed from '{}' to '{}'.",
                old.address, status.address
            ));
        }

        if toggles.on_version_change && status.version != old.version {
            push(format!(
                "Version changed from '{}' to '{}'.",
                old.version, status.version
            ));
        }

        if toggles.on_update_available_change && status.update_available != old.update_available {
            if status.update_available {
                push("Update is available, please restart server.".to_string());
            } else {
                push("Update was installed.".to_string());
            }
        }
    }

    for server_id in previous.keys().filter(|id| !current.contains_key(*id)) {
        info!("Server {} is no longer reported by the provider", server_id);
    }

    events
}
