//! sketchrelay - real-time shared canvas relay.
//!
//! Accepts WebSocket peers, validates drawing events and fans them out to
//! every other connected peer. A small HTTP surface rides alongside for
//! health probing, demo accounts, a mock diagram cleanup and static pages.

pub mod accounts;
pub mod config;
pub mod diagram;
pub mod error;
pub mod relay;
pub mod server;
