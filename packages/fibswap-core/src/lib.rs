//! FibSwap Core: network configuration and swap orchestration for FibSwapDex
//!
//! This crate provides the pieces shared by the FibSwap server and its tests:
//!
//! - **Networks** - Immutable table of supported chains, token pools and tokens
//! - **Units** - Exact decimal string <-> raw token unit conversion
//! - **Errors** - Swap error type and contract error normalization
//! - **EVM Module** - TokenPool/ERC20 bindings, event decoding, the `PoolGateway` seam
//! - **Swap** - Quote, allowance/approval and transfer pipeline
//! - **Testing Module** - Recording mock gateway for pipeline tests
//!
//! ## Feature Flags
//!
//! - `testing` - Enable the mock gateway for downstream tests

pub mod error;
pub mod evm;
pub mod networks;
pub mod redact;
pub mod swap;
pub mod units;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{ContractError, ErrorCode, SwapError};
pub use evm::{EvmPoolGateway, PoolEvent, PoolGateway, SendFee, SendTokensCall, TxReceipt};
pub use networks::{Network, NetworkRegistry};
pub use swap::{
    Approval, PoolStatus, Quote, StepError, SwapClient, SwapOutcome, SwapRequest, SwapStep,
    TokenBalance, TransferHandle, TransferReceipt, WalletContext,
};
pub use units::{format_units, parse_units, TOKEN_DECIMALS};
