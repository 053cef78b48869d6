//! EVM Chain Support Module
//!
//! ## Submodules
//!
//! - `contracts` - TokenPool and ERC20 bindings using alloy sol! macro
//! - `events` - Decoding of TokenPool events
//! - `gateway` - `PoolGateway` trait and its alloy-backed implementation

pub mod contracts;
pub mod events;
pub mod gateway;

pub use contracts::{TokenPool, ERC20};
pub use events::{PoolEvent, TokensReceivedEvent, TokensSentEvent};
pub use gateway::{EvmPoolGateway, PoolGateway, SendFee, SendTokensCall, TxReceipt};
