//! Test support
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for downstream crates that need a `PoolGateway` without an RPC node.

pub mod mock_gateway;

pub use mock_gateway::{GatewayCall, MockGateway};

use alloy::primitives::{address, Address};

/// Account used as the connected wallet in tests (Anvil's first default account)
pub const TEST_ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// A second account used as an explicit recipient
pub const TEST_RECIPIENT: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
