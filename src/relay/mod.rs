//! Real-time relay core.
//!
//! Provides the connection registry, the drawing event schema and the
//! broadcast pass that fans inbound events out to the other peers.

pub mod broadcast;
pub mod connection;
pub mod event;
pub mod registry;

pub use broadcast::*;
pub use connection::*;
pub use event::*;
pub use registry::*;
