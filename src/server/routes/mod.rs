//! Route handlers module.

pub mod auth;
pub mod cleanup;
pub mod health;
