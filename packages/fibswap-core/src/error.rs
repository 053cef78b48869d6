//! Error types for swap orchestration
//!
//! `SwapError` is what every pipeline step returns. Failures coming back from
//! the RPC node or the wallet are normalized into a [`ContractError`] carrying
//! a message, a coarse error code and, when known, the transaction hash.

use alloy::primitives::{TxHash, U256};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a contract/RPC failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The wallet or signer refused the request
    ActionRejected,
    /// The call or transaction reverted
    CallException,
    /// Not enough native balance for value + gas
    InsufficientFunds,
    /// The RPC did not answer in time
    Timeout,
    /// Connection level failure
    NetworkError,
    /// Anything else
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ActionRejected => "ACTION_REJECTED",
            ErrorCode::CallException => "CALL_EXCEPTION",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw error message
pub fn classify_error(message: &str) -> ErrorCode {
    let lower = message.to_lowercase();

    if lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected the request")
        || lower.contains("action_rejected")
    {
        return ErrorCode::ActionRejected;
    }

    if lower.contains("insufficient funds") {
        return ErrorCode::InsufficientFunds;
    }

    if lower.contains("revert") || lower.contains("execution reverted") {
        return ErrorCode::CallException;
    }

    if lower.contains("timeout") || lower.contains("timed out") {
        return ErrorCode::Timeout;
    }

    if lower.contains("connection")
        || lower.contains("network")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("too many requests")
    {
        return ErrorCode::NetworkError;
    }

    ErrorCode::UnknownError
}

/// Normalized contract interaction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ContractError {
    pub message: String,
    pub code: ErrorCode,
    pub tx_hash: Option<TxHash>,
}

impl ContractError {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
            tx_hash: None,
        }
    }

    /// Build from any error coming out of alloy, the node or the wallet
    pub fn normalize(err: impl fmt::Display) -> Self {
        let message = err.to_string();
        let code = classify_error(&message);
        Self {
            message,
            code,
            tx_hash: None,
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Chain not supported: {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error("Unknown network: {key}")]
    UnknownNetwork { key: String },

    #[error("Source and destination are both {key}")]
    SameNetwork { key: String },

    #[error("Token {symbol} is not supported on {network}")]
    UnsupportedToken { symbol: String, network: String },

    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },

    #[error("Invalid address '{address}'")]
    InvalidAddress { address: String },

    #[error("Token pool on {network} is paused")]
    PoolPaused { network: String },

    #[error("Amount {amount} exceeds the pool transaction limit {limit}")]
    AmountAboveLimit { amount: U256, limit: U256 },

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHash },

    #[error("Transaction {tx_hash} not confirmed after {timeout_secs}s")]
    Timeout { tx_hash: TxHash, timeout_secs: u64 },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SwapError {
    pub(crate) fn invalid_amount(amount: &str, reason: impl Into<String>) -> Self {
        SwapError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API consumers
    pub fn code(&self) -> &'static str {
        match self {
            SwapError::WalletNotConnected => "WALLET_NOT_CONNECTED",
            SwapError::UnsupportedChain { .. } => "UNSUPPORTED_CHAIN",
            SwapError::UnknownNetwork { .. } => "UNKNOWN_NETWORK",
            SwapError::SameNetwork { .. } => "SAME_NETWORK",
            SwapError::UnsupportedToken { .. } => "UNSUPPORTED_TOKEN",
            SwapError::InvalidAmount { .. } => "INVALID_AMOUNT",
            SwapError::InvalidAddress { .. } => "INVALID_ADDRESS",
            SwapError::PoolPaused { .. } => "POOL_PAUSED",
            SwapError::AmountAboveLimit { .. } => "AMOUNT_ABOVE_LIMIT",
            SwapError::TransactionReverted { .. } => "TRANSACTION_REVERTED",
            SwapError::Timeout { .. } => "TIMEOUT",
            SwapError::Contract(e) => e.code.as_str(),
        }
    }

    /// Transaction hash attached to the failure, if any
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SwapError::TransactionReverted { tx_hash } | SwapError::Timeout { tx_hash, .. } => {
                Some(*tx_hash)
            }
            SwapError::Contract(e) => e.tx_hash,
            _ => None,
        }
    }

    /// Whether the failure happened before anything reached the chain
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SwapError::WalletNotConnected
                | SwapError::UnsupportedChain { .. }
                | SwapError::UnknownNetwork { .. }
                | SwapError::SameNetwork { .. }
                | SwapError::UnsupportedToken { .. }
                | SwapError::InvalidAmount { .. }
                | SwapError::InvalidAddress { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_wallet_rejection() {
        assert_eq!(
            classify_error("MetaMask Tx Signature: User denied transaction signature."),
            ErrorCode::ActionRejected
        );
        assert_eq!(
            classify_error("user rejected the request"),
            ErrorCode::ActionRejected
        );
    }

    #[test]
    fn test_classify_revert_and_funds() {
        assert_eq!(
            classify_error("server returned an error response: execution reverted: Pausable: paused"),
            ErrorCode::CallException
        );
        assert_eq!(
            classify_error("insufficient funds for gas * price + value"),
            ErrorCode::InsufficientFunds
        );
    }

    #[test]
    fn test_classify_transport() {
        assert_eq!(classify_error("request timed out"), ErrorCode::Timeout);
        assert_eq!(
            classify_error("error sending request: connection refused"),
            ErrorCode::NetworkError
        );
        assert_eq!(classify_error("something odd"), ErrorCode::UnknownError);
    }

    #[test]
    fn test_normalize_keeps_message() {
        let err = ContractError::normalize("execution reverted: amount too low");
        assert_eq!(err.message, "execution reverted: amount too low");
        assert_eq!(err.code, ErrorCode::CallException);
        assert!(err.tx_hash.is_none());

        let hash = TxHash::with_last_byte(7);
        let err = err.with_tx_hash(hash);
        assert_eq!(SwapError::from(err).tx_hash(), Some(hash));
    }

    #[test]
    fn test_swap_error_codes() {
        assert_eq!(SwapError::WalletNotConnected.code(), "WALLET_NOT_CONNECTED");
        assert!(SwapError::WalletNotConnected.is_validation());

        let reverted = SwapError::TransactionReverted {
            tx_hash: TxHash::ZERO,
        };
        assert_eq!(reverted.code(), "TRANSACTION_REVERTED");
        assert!(!reverted.is_validation());

        let rejected = SwapError::Contract(ContractError::new("no", ErrorCode::ActionRejected));
        assert_eq!(rejected.code(), "ACTION_REJECTED");
    }

    #[test]
    fn test_error_code_serializes_screaming_case() {
        let json = serde_json::to_string(&ErrorCode::InsufficientFunds).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_FUNDS\"");
    }
}
