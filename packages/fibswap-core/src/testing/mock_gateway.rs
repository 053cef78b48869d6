//! Recording in-memory `PoolGateway`
//!
//! Every call is appended to a log so tests can assert on ordering (approve
//! before sendTokens) and on the absence of calls (validation failures never
//! reach the chain). Writes hand out deterministic transaction hashes and the
//! matching receipts are synthesized on `wait_for_receipt`.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{Address, Log, TxHash, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;

use crate::error::{ContractError, ErrorCode, SwapError};
use crate::evm::contracts::TokenPool;
use crate::evm::gateway::{PoolGateway, SendFee, SendTokensCall, TxReceipt};

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ChainId,
    CalculateFee {
        pool: Address,
        amount: U256,
    },
    EstimateSendFee {
        pool: Address,
        dst_chain_id: u16,
        to: Address,
        amount: U256,
    },
    IsSupported {
        pool: Address,
        token: Address,
    },
    PoolBalance {
        pool: Address,
        token: Address,
    },
    MaxTransactionAmount {
        pool: Address,
    },
    Paused {
        pool: Address,
    },
    BalanceOf {
        token: Address,
        owner: Address,
    },
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    SendTokens(SendTokensCall),
    WaitForReceipt {
        tx_hash: TxHash,
    },
}

impl GatewayCall {
    /// Calls that would submit a transaction
    pub fn is_write(&self) -> bool {
        matches!(self, GatewayCall::Approve { .. } | GatewayCall::SendTokens(_))
    }
}

#[derive(Debug, Clone)]
enum SubmittedTx {
    Approval,
    Transfer(SendTokensCall),
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    base_fee: U256,
    send_fee: SendFee,
    allowance: U256,
    paused: bool,
    supported: bool,
    max_transaction_amount: U256,
    pool_balance: U256,
    wallet_balance: U256,
    quote_error: Option<String>,
    approve_error: Option<String>,
    send_error: Option<String>,
    approval_reverts: bool,
    transfer_reverts: bool,
    transfer_times_out: bool,
    next_tx: u8,
    submitted: HashMap<TxHash, SubmittedTx>,
    calls: Vec<GatewayCall>,
}

/// Scriptable gateway; defaults model a healthy pool with no allowance
#[derive(Debug)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Ethereum mainnet, 1 USDC base fee, 0.002 native messaging fee
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: 1,
                base_fee: U256::from(1_000_000u64),
                send_fee: SendFee {
                    native_fee: U256::from(2_000_000_000_000_000u64),
                    zro_fee: U256::ZERO,
                },
                allowance: U256::ZERO,
                paused: false,
                supported: true,
                max_transaction_amount: U256::ZERO,
                pool_balance: U256::from(250_000_000_000u64),
                wallet_balance: U256::from(5_000_000_000u64),
                quote_error: None,
                approve_error: None,
                send_error: None,
                approval_reverts: false,
                transfer_reverts: false,
                transfer_times_out: false,
                next_tx: 0,
                submitted: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    fn update(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut *self.state.lock().expect("mock state poisoned"));
        self
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.update(|s| s.chain_id = chain_id)
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.update(|s| s.allowance = allowance)
    }

    pub fn with_fees(self, base_fee: U256, native_fee: U256) -> Self {
        self.update(|s| {
            s.base_fee = base_fee;
            s.send_fee.native_fee = native_fee;
        })
    }

    pub fn paused(self) -> Self {
        self.update(|s| s.paused = true)
    }

    pub fn unsupported(self) -> Self {
        self.update(|s| s.supported = false)
    }

    pub fn with_max_transaction_amount(self, max: U256) -> Self {
        self.update(|s| s.max_transaction_amount = max)
    }

    pub fn with_pool_balance(self, balance: U256) -> Self {
        self.update(|s| s.pool_balance = balance)
    }

    pub fn with_wallet_balance(self, balance: U256) -> Self {
        self.update(|s| s.wallet_balance = balance)
    }

    /// `calculateFee` and `estimateSendFee` fail with `message`
    pub fn failing_quote(self, message: &str) -> Self {
        let message = message.to_string();
        self.update(|s| s.quote_error = Some(message))
    }

    /// `approve` fails at submission with `message`
    pub fn failing_approval(self, message: &str) -> Self {
        let message = message.to_string();
        self.update(|s| s.approve_error = Some(message))
    }

    /// `approve` is accepted but its receipt reports a revert
    pub fn reverting_approval(self) -> Self {
        self.update(|s| s.approval_reverts = true)
    }

    /// `sendTokens` fails at submission with `message`
    pub fn failing_transfer(self, message: &str) -> Self {
        let message = message.to_string();
        self.update(|s| s.send_error = Some(message))
    }

    /// `sendTokens` is accepted but its receipt reports a revert
    pub fn reverting_transfer(self) -> Self {
        self.update(|s| s.transfer_reverts = true)
    }

    /// `sendTokens` is accepted but no receipt shows up before the timeout
    pub fn timing_out_transfer(self) -> Self {
        self.update(|s| s.transfer_times_out = true)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().expect("mock state poisoned").calls.clone()
    }

    /// Only the transaction-submitting calls
    pub fn writes(&self) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(GatewayCall::is_write).collect()
    }

    /// Current allowance (grows when an approval succeeds)
    pub fn allowance_value(&self) -> U256 {
        self.state.lock().expect("mock state poisoned").allowance
    }

    fn record(&self, call: GatewayCall) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.calls.push(call);
        state
    }

    fn next_hash(state: &mut MockState) -> TxHash {
        state.next_tx += 1;
        TxHash::with_last_byte(state.next_tx)
    }
}

#[async_trait]
impl PoolGateway for MockGateway {
    async fn chain_id(&self) -> Result<u64, SwapError> {
        Ok(self.record(GatewayCall::ChainId).chain_id)
    }

    async fn calculate_fee(&self, pool: Address, amount: U256) -> Result<U256, SwapError> {
        let state = self.record(GatewayCall::CalculateFee { pool, amount });
        match &state.quote_error {
            Some(message) => Err(ContractError::normalize(message).into()),
            None => Ok(state.base_fee),
        }
    }

    async fn estimate_send_fee(
        &self,
        pool: Address,
        dst_chain_id: u16,
        to: Address,
        amount: U256,
    ) -> Result<SendFee, SwapError> {
        let state = self.record(GatewayCall::EstimateSendFee {
            pool,
            dst_chain_id,
            to,
            amount,
        });
        match &state.quote_error {
            Some(message) => Err(ContractError::normalize(message).into()),
            None => Ok(state.send_fee),
        }
    }

    async fn is_supported(&self, pool: Address, token: Address) -> Result<bool, SwapError> {
        Ok(self.record(GatewayCall::IsSupported { pool, token }).supported)
    }

    async fn pool_balance(&self, pool: Address, token: Address) -> Result<U256, SwapError> {
        Ok(self.record(GatewayCall::PoolBalance { pool, token }).pool_balance)
    }

    async fn max_transaction_amount(&self, pool: Address) -> Result<U256, SwapError> {
        Ok(self
            .record(GatewayCall::MaxTransactionAmount { pool })
            .max_transaction_amount)
    }

    async fn paused(&self, pool: Address) -> Result<bool, SwapError> {
        Ok(self.record(GatewayCall::Paused { pool }).paused)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        Ok(self.record(GatewayCall::BalanceOf { token, owner }).wallet_balance)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError> {
        Ok(self
            .record(GatewayCall::Allowance {
                token,
                owner,
                spender,
            })
            .allowance)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, SwapError> {
        let mut state = self.record(GatewayCall::Approve {
            token,
            spender,
            amount,
        });
        if let Some(message) = &state.approve_error {
            return Err(ContractError::normalize(message).into());
        }

        let tx_hash = Self::next_hash(&mut state);
        state.submitted.insert(tx_hash, SubmittedTx::Approval);
        if !state.approval_reverts {
            state.allowance = amount;
        }
        Ok(tx_hash)
    }

    async fn send_tokens(&self, call: &SendTokensCall) -> Result<TxHash, SwapError> {
        let mut state = self.record(GatewayCall::SendTokens(call.clone()));
        if let Some(message) = &state.send_error {
            return Err(ContractError::normalize(message).into());
        }

        let tx_hash = Self::next_hash(&mut state);
        state
            .submitted
            .insert(tx_hash, SubmittedTx::Transfer(call.clone()));
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, SwapError> {
        let state = self.record(GatewayCall::WaitForReceipt { tx_hash });

        let receipt = match state.submitted.get(&tx_hash) {
            Some(SubmittedTx::Approval) => TxReceipt {
                tx_hash,
                success: !state.approval_reverts,
                block_number: Some(100),
                logs: Vec::new(),
            },
            Some(SubmittedTx::Transfer(_)) if state.transfer_times_out => {
                return Err(SwapError::Timeout {
                    tx_hash,
                    timeout_secs: 300,
                })
            }
            Some(SubmittedTx::Transfer(_)) if state.transfer_reverts => TxReceipt {
                tx_hash,
                success: false,
                block_number: Some(101),
                logs: Vec::new(),
            },
            Some(SubmittedTx::Transfer(call)) => {
                let event = TokenPool::TokensSent {
                    token: call.token,
                    from: call.refund_address,
                    to: call.to,
                    amount: call.amount,
                    dstChainId: call.dst_chain_id,
                };
                TxReceipt {
                    tx_hash,
                    success: true,
                    block_number: Some(101),
                    logs: vec![Log {
                        address: call.pool,
                        data: event.encode_log_data(),
                    }],
                }
            }
            None => {
                return Err(ContractError::new(
                    format!("transaction {tx_hash} not found"),
                    ErrorCode::UnknownError,
                )
                .with_tx_hash(tx_hash)
                .into())
            }
        };
        Ok(receipt)
    }
}
