//! FibSwap Server - Library interface
//!
//! Re-exports internal modules for use in integration tests.

pub mod admin;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
