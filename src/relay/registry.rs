//! Authoritative set of live connections.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::connection::{Connection, ConnectionId};

/// Tracks every connection that should receive broadcasts.
///
/// Each operation takes the lock for a single step and never holds it across
/// an await, so a broadcast pass always iterates a consistent copy.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Live connections in registration order.
    live: RwLock<Vec<Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Connection>>> {
        self.live.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Connection>>> {
        self.live.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a handshaken connection and opens it.
    ///
    /// The state change happens under the write lock, so no snapshot ever
    /// observes a half-registered connection. Registering the same
    /// connection twice is a no-op.
    pub fn register(&self, connection: Arc<Connection>) {
        let mut live = self.write();
        if live.iter().any(|c| c.id() == connection.id()) {
            return;
        }
        connection.mark_open();
        live.push(connection);
        tracing::info!(active = live.len(), "Client connected");
    }

    /// Removes a connection if present and closes it. Idempotent.
    ///
    /// Returns whether the connection was registered.
    pub fn unregister(&self, connection: &Connection) -> bool {
        let mut live = self.write();
        let before = live.len();
        live.retain(|c| c.id() != connection.id());
        connection.mark_closed();

        let removed = live.len() < before;
        if removed {
            tracing::info!(active = live.len(), "Client disconnected");
        }
        removed
    }

    /// Removes every listed connection in one step. Returns how many were
    /// still registered.
    pub fn unregister_all(&self, ids: &[ConnectionId]) -> usize {
        if ids.is_empty() {
            return 0;
        }

        let mut live = self.write();
        let before = live.len();
        live.retain(|c| {
            if ids.contains(&c.id()) {
                c.mark_closed();
                false
            } else {
                true
            }
        });
        let removed = before - live.len();
        if removed > 0 {
            tracing::info!(removed, active = live.len(), "Dropped dead clients");
        }
        removed
    }

    /// Point-in-time copy of the live set.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.read().clone()
    }

    /// Number of live connections.
    pub fn count(&self) -> usize {
        self.read().len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: ConnectionId) -> bool {
        self.read().iter().any(|c| c.id() == id)
    }
}
