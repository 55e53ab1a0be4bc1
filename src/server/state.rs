//! Shared application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::accounts::AccountStore;
use crate::config::Config;
use crate::relay::{Connection, ConnectionRegistry, Frame, Relay};

/// Application state shared across all handlers.
pub struct AppState {
    /// Broadcast relay over the live connection registry.
    pub relay: Relay,
    /// Demo login accounts.
    pub accounts: AccountStore,
    send_queue: usize,
    send_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Creates the state with a fresh, empty registry.
    pub fn new(config: &Config, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            relay: Relay::new(Arc::new(ConnectionRegistry::new())),
            accounts: AccountStore::with_demo_user(),
            send_queue: config.send_queue,
            send_timeout: config.send_timeout(),
            shutdown,
        }
    }

    /// Creates a connection configured for this server, plus its outbound queue.
    pub fn new_connection(&self) -> (Connection, tokio::sync::mpsc::Receiver<Frame>) {
        let (connection, outbound) = Connection::channel(self.send_queue);
        (connection.with_send_timeout(self.send_timeout), outbound)
    }

    /// Subscribe to the shutdown signal.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }

    pub fn active_connections(&self) -> usize {
        self.relay.registry().count()
    }
}
