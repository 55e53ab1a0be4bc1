//! Handle to a single connected peer.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Frame queued for delivery to a peer. Shared so a fan-out pass does not
/// copy the payload once per target.
pub type Frame = Arc<str>;

/// Unique identity of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a connection.
///
/// `Connecting -> Open -> Closing -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Delivery to a peer failed; the peer is treated as dead.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("connection {0} did not accept the frame within {1:?}")]
    Timeout(ConnectionId, Duration),
}

/// A connected peer.
///
/// Outbound frames go through a bounded queue drained by the peer's writer
/// task. Once the writer stops, the queue closes and sends fail.
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<Frame>,
    send_timeout: Option<Duration>,
    state: AtomicU8,
    connected_at: DateTime<Utc>,
}

impl Connection {
    /// Creates a connection in the `Connecting` state over the given queue.
    pub fn new(outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            id: ConnectionId::new(),
            outbound,
            send_timeout: None,
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            connected_at: Utc::now(),
        }
    }

    /// Creates a connection together with the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Bounds how long a single send may wait for queue capacity.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Seconds since the handshake completed.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.connected_at).num_seconds().max(0)
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Connecting -> Open`. Returns false if the connection already left
    /// `Connecting`.
    pub(crate) fn mark_open(&self) -> bool {
        self.transition(ConnectionState::Connecting, ConnectionState::Open)
    }

    /// `Open -> Closing`. Returns false if the connection was not open.
    pub fn mark_closing(&self) -> bool {
        self.transition(ConnectionState::Open, ConnectionState::Closing)
    }

    /// Moves to the terminal `Closed` state from anywhere.
    pub(crate) fn mark_closed(&self) {
        self.state.store(ConnectionState::Closed as u8, Ordering::Release);
    }

    fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Queues a frame for the peer, waiting for capacity if the queue is full.
    pub async fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        if self.state() == ConnectionState::Closed {
            return Err(DeliveryError::Closed(self.id));
        }

        match self.send_timeout {
            Some(timeout) => self
                .outbound
                .send_timeout(frame, timeout)
                .await
                .map_err(|e| match e {
                    mpsc::error::SendTimeoutError::Timeout(_) => {
                        DeliveryError::Timeout(self.id, timeout)
                    }
                    mpsc::error::SendTimeoutError::Closed(_) => DeliveryError::Closed(self.id),
                }),
            None => self
                .outbound
                .send(frame)
                .await
                .map_err(|_| DeliveryError::Closed(self.id)),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
