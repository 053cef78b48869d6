//! Swap Orchestration
//!
//! [`SwapClient`] drives a cross-chain transfer from the connected wallet's
//! network to a destination network as an ordered pipeline:
//!
//! 1. **Preflight** - wallet, amount, destination and recipient are validated
//!    locally, then the source pool is checked (`paused`, `isSupported`,
//!    `maxTransactionAmount`)
//! 2. **Quote** - base fee from `calculateFee`, messaging fee from
//!    `estimateSendFee`
//! 3. **Allowance** - `approve` for exactly the amount when the current
//!    allowance is short, confirmed before moving on
//! 4. **Transfer** - `sendTokens` with the messaging fee attached as value
//! 5. **Confirm** - wait for the receipt and decode `TokensSent`
//!
//! Each step either yields its outcome or stops the pipeline with a
//! [`StepError`] naming the step. Local validation failures never reach the
//! gateway.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SwapError;
use crate::evm::events::{find_tokens_sent, TokensSentEvent};
use crate::evm::gateway::{PoolGateway, SendTokensCall};
use crate::networks::{Network, NetworkRegistry};
use crate::units::{format_units, parse_units, TOKEN_DECIMALS};

/// Connection state of the signing wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletContext {
    /// Connected account; `None` when no wallet is connected
    pub account: Option<Address>,
    /// Native chain the wallet (or read-only provider) is on
    pub chain_id: Option<u64>,
}

impl WalletContext {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(account: Address, chain_id: u64) -> Self {
        Self {
            account: Some(account),
            chain_id: Some(chain_id),
        }
    }

    /// A provider without a signer: reads work, writes do not
    pub fn read_only(chain_id: u64) -> Self {
        Self {
            account: None,
            chain_id: Some(chain_id),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }
}

/// Fee quote for moving `amount` to `destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Source network key
    pub source: String,
    /// Destination network key
    pub destination: String,
    /// Messaging-layer id of the destination
    pub dst_chain_id: u16,
    pub recipient: Address,
    pub amount: U256,
    /// Pool fee from `calculateFee`
    pub base_fee: U256,
    /// `nativeFee` from `estimateSendFee`, attached as msg.value on transfer
    pub messaging_fee: U256,
    /// `base_fee + messaging_fee`
    pub total_fee: U256,
}

impl Quote {
    pub fn amount_display(&self) -> String {
        format_units(self.amount, TOKEN_DECIMALS)
    }

    pub fn base_fee_display(&self) -> String {
        format_units(self.base_fee, TOKEN_DECIMALS)
    }

    pub fn messaging_fee_display(&self) -> String {
        format_units(self.messaging_fee, TOKEN_DECIMALS)
    }

    pub fn total_fee_display(&self) -> String {
        format_units(self.total_fee, TOKEN_DECIMALS)
    }
}

/// Everything the pipeline needs from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    /// Destination network key (e.g. "bsc")
    pub destination: String,
    /// Token symbol on the source network (e.g. "USDC")
    pub token: String,
    /// Decimal amount string (e.g. "1000.5")
    pub amount: String,
    /// Recipient on the destination; blank means the connected account
    pub recipient: Option<String>,
}

/// Outcome of the allowance step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Existing allowance already covers the amount
    Sufficient { allowance: U256 },
    /// An approval for exactly the amount was confirmed
    Approved { tx_hash: TxHash },
}

/// A submitted `sendTokens` transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferHandle {
    pub tx_hash: TxHash,
    pub source: String,
    pub destination: String,
    pub call: SendTokensCall,
}

/// A confirmed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Decoded `TokensSent` event, when the pool emitted one
    pub sent: Option<TokensSentEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub symbol: String,
    pub token: Address,
    pub balance: U256,
}

/// On-chain state of the wallet network's pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub network: String,
    pub pool: Address,
    pub paused: bool,
    /// Zero means no limit
    pub max_transaction_amount: U256,
    pub balances: Vec<TokenBalance>,
}

/// Pipeline step names, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStep {
    Preflight,
    Quote,
    Allowance,
    Transfer,
    Confirm,
}

impl SwapStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStep::Preflight => "preflight",
            SwapStep::Quote => "quote",
            SwapStep::Allowance => "allowance",
            SwapStep::Transfer => "transfer",
            SwapStep::Confirm => "confirm",
        }
    }

    /// Tag a failure with this step and log it
    fn fail(self) -> impl FnOnce(SwapError) -> StepError {
        move |source| {
            warn!(step = %self, code = source.code(), error = %source, "Swap step failed");
            StepError { step: self, source }
        }
    }
}

impl fmt::Display for SwapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline failure tagged with the step that produced it
#[derive(Debug, Error)]
#[error("{step} step failed: {source}")]
pub struct StepError {
    pub step: SwapStep,
    #[source]
    pub source: SwapError,
}

/// Successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub quote: Quote,
    pub approval: Approval,
    pub transfer: TransferHandle,
    pub receipt: TransferReceipt,
}

/// Locally validated swap parameters
struct Route<'a> {
    account: Address,
    source: &'a Network,
    destination: &'a Network,
    amount: U256,
    recipient: Address,
}

pub struct SwapClient {
    gateway: Arc<dyn PoolGateway>,
    registry: Arc<NetworkRegistry>,
    wallet: WalletContext,
}

impl SwapClient {
    pub fn new(
        gateway: Arc<dyn PoolGateway>,
        registry: Arc<NetworkRegistry>,
        wallet: WalletContext,
    ) -> Self {
        Self {
            gateway,
            registry,
            wallet,
        }
    }

    pub fn wallet(&self) -> WalletContext {
        self.wallet
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Network the wallet is currently on
    pub fn active_network(&self) -> Result<&Network, SwapError> {
        let chain_id = self.wallet.chain_id.ok_or(SwapError::WalletNotConnected)?;
        self.registry
            .by_chain_id(chain_id)
            .ok_or(SwapError::UnsupportedChain { chain_id })
    }

    fn context(&self) -> Result<(Address, &Network), SwapError> {
        let account = self.wallet.account.ok_or(SwapError::WalletNotConnected)?;
        let network = self.active_network()?;
        Ok((account, network))
    }

    /// Check that the RPC endpoint serves the chain the wallet claims
    pub async fn verify_chain(&self) -> Result<(), SwapError> {
        let expected = self.active_network()?.chain_id;
        let actual = self.gateway.chain_id().await?;
        if actual != expected {
            return Err(SwapError::UnsupportedChain { chain_id: actual });
        }
        Ok(())
    }

    fn route(
        &self,
        amount: &str,
        destination: &str,
        recipient: Option<&str>,
    ) -> Result<Route<'_>, SwapError> {
        let (account, source) = self.context()?;
        let amount = parse_units(amount, TOKEN_DECIMALS)?;

        let destination = self.registry.require(destination)?;
        if destination.key == source.key {
            return Err(SwapError::SameNetwork {
                key: source.key.clone(),
            });
        }

        let recipient = resolve_recipient(recipient, account)?;

        Ok(Route {
            account,
            source,
            destination,
            amount,
            recipient,
        })
    }

    async fn price(&self, route: &Route<'_>) -> Result<Quote, SwapError> {
        let pool = route.source.pool_address;

        let base_fee = self.gateway.calculate_fee(pool, route.amount).await?;
        let send_fee = self
            .gateway
            .estimate_send_fee(
                pool,
                route.destination.messaging_chain_id,
                route.recipient,
                route.amount,
            )
            .await?;

        let quote = Quote {
            source: route.source.key.clone(),
            destination: route.destination.key.clone(),
            dst_chain_id: route.destination.messaging_chain_id,
            recipient: route.recipient,
            amount: route.amount,
            base_fee,
            messaging_fee: send_fee.native_fee,
            total_fee: base_fee.saturating_add(send_fee.native_fee),
        };

        debug!(
            source = %quote.source,
            destination = %quote.destination,
            amount = %quote.amount,
            base_fee = %quote.base_fee,
            messaging_fee = %quote.messaging_fee,
            "Computed quote"
        );

        Ok(quote)
    }

    /// Quote the fees for sending `amount` to `destination`
    ///
    /// A missing wallet, an unparseable amount or an unknown destination
    /// fail before any RPC call.
    pub async fn quote(
        &self,
        amount: &str,
        destination: &str,
        recipient: Option<&str>,
    ) -> Result<Quote, SwapError> {
        let route = self.route(amount, destination, recipient)?;
        self.price(&route).await
    }

    /// On-chain checks run before quoting a transfer of `amount` of `symbol`
    /// (whose contract on the source network is `token`)
    pub async fn preflight(
        &self,
        symbol: &str,
        token: Address,
        amount: U256,
    ) -> Result<(), SwapError> {
        let network = self.active_network()?;
        let pool = network.pool_address;

        if self.gateway.paused(pool).await? {
            return Err(SwapError::PoolPaused {
                network: network.key.clone(),
            });
        }

        if !self.gateway.is_supported(pool, token).await? {
            return Err(SwapError::UnsupportedToken {
                symbol: symbol.to_string(),
                network: network.key.clone(),
            });
        }

        let limit = self.gateway.max_transaction_amount(pool).await?;
        if !limit.is_zero() && amount > limit {
            return Err(SwapError::AmountAboveLimit { amount, limit });
        }

        Ok(())
    }

    /// Make sure the pool may draw `amount` of `token` from the account
    pub async fn ensure_allowance(&self, token: Address, amount: U256) -> Result<Approval, SwapError> {
        let (account, network) = self.context()?;
        let spender = network.pool_address;

        let allowance = self.gateway.allowance(token, account, spender).await?;
        if allowance >= amount {
            debug!(token = %token, allowance = %allowance, amount = %amount, "Allowance sufficient");
            return Ok(Approval::Sufficient { allowance });
        }

        info!(token = %token, spender = %spender, amount = %amount, "Approving pool");
        let tx_hash = self.gateway.approve(token, spender, amount).await?;

        let receipt = self.gateway.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(SwapError::TransactionReverted { tx_hash });
        }

        info!(tx_hash = %tx_hash, block = ?receipt.block_number, "Approval confirmed");
        Ok(Approval::Approved { tx_hash })
    }

    /// Submit `sendTokens` for a computed quote
    pub async fn submit_transfer(
        &self,
        quote: &Quote,
        token_symbol: &str,
    ) -> Result<TransferHandle, SwapError> {
        let (account, _) = self.context()?;
        let source = self.registry.require(&quote.source)?;
        let token = source.token(token_symbol)?;

        let call = SendTokensCall {
            pool: source.pool_address,
            dst_chain_id: quote.dst_chain_id,
            to: quote.recipient,
            token,
            amount: quote.amount,
            refund_address: account,
            value: quote.messaging_fee,
        };

        let tx_hash = self.gateway.send_tokens(&call).await?;

        info!(
            tx_hash = %tx_hash,
            source = %quote.source,
            destination = %quote.destination,
            token = %token_symbol,
            amount = %quote.amount_display(),
            "Transfer submitted"
        );

        Ok(TransferHandle {
            tx_hash,
            source: quote.source.clone(),
            destination: quote.destination.clone(),
            call,
        })
    }

    /// Wait for a submitted transfer to be included
    pub async fn confirm(&self, handle: &TransferHandle) -> Result<TransferReceipt, SwapError> {
        let receipt = self.gateway.wait_for_receipt(handle.tx_hash).await?;
        if !receipt.success {
            return Err(SwapError::TransactionReverted {
                tx_hash: handle.tx_hash,
            });
        }

        let sent = find_tokens_sent(&receipt.logs, handle.call.pool);
        if sent.is_none() {
            debug!(tx_hash = %handle.tx_hash, "Receipt carried no TokensSent event");
        }

        info!(tx_hash = %handle.tx_hash, block = ?receipt.block_number, "Transfer confirmed");

        Ok(TransferReceipt {
            tx_hash: handle.tx_hash,
            block_number: receipt.block_number,
            sent,
        })
    }

    /// Run the full pipeline
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome, StepError> {
        info!(
            destination = %request.destination,
            token = %request.token,
            amount = %request.amount,
            "Starting swap"
        );

        let route = self
            .route(
                &request.amount,
                &request.destination,
                request.recipient.as_deref(),
            )
            .map_err(SwapStep::Preflight.fail())?;
        let token = route
            .source
            .token(&request.token)
            .map_err(SwapStep::Preflight.fail())?;
        self.preflight(&request.token, token, route.amount)
            .await
            .map_err(SwapStep::Preflight.fail())?;

        let quote = self.price(&route).await.map_err(SwapStep::Quote.fail())?;

        let approval = self
            .ensure_allowance(token, quote.amount)
            .await
            .map_err(SwapStep::Allowance.fail())?;

        let transfer = self
            .submit_transfer(&quote, &request.token)
            .await
            .map_err(SwapStep::Transfer.fail())?;

        let receipt = self
            .confirm(&transfer)
            .await
            .map_err(SwapStep::Confirm.fail())?;

        info!(
            tx_hash = %receipt.tx_hash,
            account = %route.account,
            recipient = %quote.recipient,
            "Swap complete"
        );

        Ok(SwapOutcome {
            quote,
            approval,
            transfer,
            receipt,
        })
    }

    /// Pause flag, limit and token balances of the wallet network's pool
    pub async fn pool_status(&self) -> Result<PoolStatus, SwapError> {
        let network = self.active_network()?;
        let pool = network.pool_address;

        let paused = self.gateway.paused(pool).await?;
        let max_transaction_amount = self.gateway.max_transaction_amount(pool).await?;

        let mut balances = Vec::with_capacity(network.tokens.len());
        for (symbol, token) in &network.tokens {
            let balance = self.gateway.pool_balance(pool, *token).await?;
            balances.push(TokenBalance {
                symbol: symbol.clone(),
                token: *token,
                balance,
            });
        }

        Ok(PoolStatus {
            network: network.key.clone(),
            pool,
            paused,
            max_transaction_amount,
            balances,
        })
    }

    /// Token balances of the connected account on its network
    pub async fn wallet_balances(&self) -> Result<Vec<TokenBalance>, SwapError> {
        let (account, network) = self.context()?;

        let mut balances = Vec::with_capacity(network.tokens.len());
        for (symbol, token) in &network.tokens {
            let balance = self.gateway.balance_of(*token, account).await?;
            balances.push(TokenBalance {
                symbol: symbol.clone(),
                token: *token,
                balance,
            });
        }
        Ok(balances)
    }
}

/// Blank recipients fall back to the connected account
fn resolve_recipient(recipient: Option<&str>, account: Address) -> Result<Address, SwapError> {
    match recipient.map(str::trim) {
        None | Some("") => Ok(account),
        Some(raw) => raw.parse::<Address>().map_err(|_| SwapError::InvalidAddress {
            address: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GatewayCall, MockGateway, TEST_ACCOUNT, TEST_RECIPIENT};
    use alloy::primitives::address;
    use tokio_test::{assert_err, assert_ok};

    const ETH_POOL: Address = address!("Ee3aA54b931c5Fc0F986D3E7380809f16762A4a9");
    const ETH_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

    /// 1000 tokens at 6 decimals
    fn thousand() -> U256 {
        U256::from(1_000_000_000u64)
    }

    fn client_with(gateway: &Arc<MockGateway>, wallet: WalletContext) -> SwapClient {
        SwapClient::new(
            gateway.clone(),
            Arc::new(NetworkRegistry::mainnet()),
            wallet,
        )
    }

    fn connected(gateway: &Arc<MockGateway>) -> SwapClient {
        client_with(gateway, WalletContext::connected(TEST_ACCOUNT, 1))
    }

    fn request(amount: &str) -> SwapRequest {
        SwapRequest {
            destination: "bsc".to_string(),
            token: "USDC".to_string(),
            amount: amount.to_string(),
            recipient: None,
        }
    }

    #[tokio::test]
    async fn test_quote_sums_fees() {
        let gateway = Arc::new(
            MockGateway::new().with_fees(U256::from(3_000_000u64), U256::from(250_000u64)),
        );
        let client = connected(&gateway);

        let quote = client.quote("1000", "polygon", None).await.unwrap();

        assert_eq!(quote.source, "ethereum");
        assert_eq!(quote.destination, "polygon");
        assert_eq!(quote.dst_chain_id, 109);
        assert_eq!(quote.amount, thousand());
        assert_eq!(quote.base_fee, U256::from(3_000_000u64));
        assert_eq!(quote.messaging_fee, U256::from(250_000u64));
        assert_eq!(quote.total_fee, U256::from(3_250_000u64));
        assert_eq!(quote.base_fee_display(), "3");
        assert_eq!(quote.messaging_fee_display(), "0.25");
        assert_eq!(quote.total_fee_display(), "3.25");

        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::CalculateFee {
                    pool: ETH_POOL,
                    amount: thousand()
                },
                GatewayCall::EstimateSendFee {
                    pool: ETH_POOL,
                    dst_chain_id: 109,
                    to: TEST_ACCOUNT,
                    amount: thousand()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_quote_rejects_bad_amounts_without_network_calls() {
        let gateway = Arc::new(MockGateway::new());
        let client = connected(&gateway);

        for amount in ["", "0", "0.0", "-5", "abc", "1.2345678", "1e6", "  "] {
            let err = client.quote(amount, "bsc", None).await.unwrap_err();
            assert!(
                matches!(err, SwapError::InvalidAmount { .. }),
                "amount {amount:?} gave {err:?}"
            );
        }
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quote_rejects_unknown_or_same_destination() {
        let gateway = Arc::new(MockGateway::new());
        let client = connected(&gateway);

        let err = client.quote("10", "solana", None).await.unwrap_err();
        assert!(matches!(err, SwapError::UnknownNetwork { .. }));

        let err = client.quote("10", "ethereum", None).await.unwrap_err();
        assert!(matches!(err, SwapError::SameNetwork { .. }));

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quote_on_unsupported_chain() {
        let gateway = Arc::new(MockGateway::new());
        let client = client_with(&gateway, WalletContext::connected(TEST_ACCOUNT, 10));

        let err = client.quote("10", "bsc", None).await.unwrap_err();
        assert!(matches!(err, SwapError::UnsupportedChain { chain_id: 10 }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_recipient_defaults_to_account() {
        let gateway = Arc::new(MockGateway::new());
        let client = connected(&gateway);

        let blank = client.quote("5", "bsc", Some("   ")).await.unwrap();
        assert_eq!(blank.recipient, TEST_ACCOUNT);

        let explicit = client
            .quote("5", "bsc", Some(&TEST_RECIPIENT.to_string()))
            .await
            .unwrap();
        assert_eq!(explicit.recipient, TEST_RECIPIENT);

        let err = client.quote("5", "bsc", Some("0x1234")).await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_no_wallet_fails_everything_without_calls() {
        let gateway = Arc::new(MockGateway::new());
        let client = client_with(&gateway, WalletContext::disconnected());

        assert!(matches!(
            client.quote("1000", "bsc", None).await,
            Err(SwapError::WalletNotConnected)
        ));
        assert!(matches!(
            client.ensure_allowance(ETH_USDC, thousand()).await,
            Err(SwapError::WalletNotConnected)
        ));
        assert!(matches!(
            client.pool_status().await,
            Err(SwapError::WalletNotConnected)
        ));
        assert!(matches!(
            client.wallet_balances().await,
            Err(SwapError::WalletNotConnected)
        ));

        let err = client.execute(&request("1000")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Preflight);
        assert!(matches!(err.source, SwapError::WalletNotConnected));

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_wallet_can_read_pool_but_not_swap() {
        let gateway = Arc::new(MockGateway::new());
        let client = client_with(&gateway, WalletContext::read_only(1));

        let status = assert_ok!(client.pool_status().await);
        assert_eq!(status.network, "ethereum");
        assert_eq!(status.balances.len(), 2);

        let err = client.execute(&request("1")).await.unwrap_err();
        assert!(matches!(err.source, SwapError::WalletNotConnected));
        assert!(gateway.writes().is_empty());
    }

    #[tokio::test]
    async fn test_allowance_short_approves_then_sends() {
        let gateway = Arc::new(MockGateway::new().with_allowance(U256::ZERO));
        let client = connected(&gateway);

        let outcome = client.execute(&request("1000")).await.unwrap();

        assert!(matches!(outcome.approval, Approval::Approved { .. }));
        assert_eq!(gateway.allowance_value(), thousand());

        let writes = gateway.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[0],
            GatewayCall::Approve {
                token: ETH_USDC,
                spender: ETH_POOL,
                amount: thousand()
            }
        );
        match &writes[1] {
            GatewayCall::SendTokens(call) => {
                assert_eq!(call.amount, thousand());
                assert_eq!(call.dst_chain_id, 102);
                assert_eq!(call.to, TEST_ACCOUNT);
                assert_eq!(call.refund_address, TEST_ACCOUNT);
                assert_eq!(call.value, outcome.quote.messaging_fee);
            }
            other => panic!("expected sendTokens, got {other:?}"),
        }

        // the approval receipt is awaited before sendTokens goes out
        let calls = gateway.calls();
        let approve_wait = calls
            .iter()
            .position(|c| matches!(c, GatewayCall::WaitForReceipt { .. }))
            .unwrap();
        let send = calls
            .iter()
            .position(|c| matches!(c, GatewayCall::SendTokens(_)))
            .unwrap();
        assert!(approve_wait < send);
    }

    #[tokio::test]
    async fn test_allowance_sufficient_sends_directly() {
        let gateway = Arc::new(MockGateway::new().with_allowance(U256::from(5_000_000_000u64)));
        let client = connected(&gateway);

        let outcome = client.execute(&request("1000")).await.unwrap();

        assert_eq!(
            outcome.approval,
            Approval::Sufficient {
                allowance: U256::from(5_000_000_000u64)
            }
        );
        let writes = gateway.writes();
        assert_eq!(writes.len(), 1);
        assert!(matches!(writes[0], GatewayCall::SendTokens(_)));
    }

    #[tokio::test]
    async fn test_outcome_carries_decoded_event() {
        let gateway = Arc::new(MockGateway::new());
        let client = connected(&gateway);

        let mut req = request("12.5");
        req.destination = "polygon".to_string();
        req.recipient = Some(TEST_RECIPIENT.to_string());

        let outcome = client.execute(&req).await.unwrap();
        let sent = outcome.receipt.sent.expect("TokensSent decoded");

        assert_eq!(sent.pool, ETH_POOL);
        assert_eq!(sent.token, ETH_USDC);
        assert_eq!(sent.from, TEST_ACCOUNT);
        assert_eq!(sent.to, TEST_RECIPIENT);
        assert_eq!(sent.amount, U256::from(12_500_000u64));
        assert_eq!(sent.dst_chain_id, 109);
        assert_eq!(outcome.receipt.tx_hash, outcome.transfer.tx_hash);
    }

    #[tokio::test]
    async fn test_quote_failure_stops_before_transfer() {
        let gateway = Arc::new(MockGateway::new().failing_quote("execution reverted: bad dst"));
        let client = connected(&gateway);

        let err = client.execute(&request("1000")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Quote);
        assert_eq!(err.source.code(), "CALL_EXCEPTION");
        assert!(gateway.writes().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_approval_stops_before_transfer() {
        let gateway = Arc::new(MockGateway::new().reverting_approval());
        let client = connected(&gateway);

        let err = client.execute(&request("1000")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Allowance);
        assert!(matches!(err.source, SwapError::TransactionReverted { .. }));

        let writes = gateway.writes();
        assert_eq!(writes.len(), 1);
        assert!(matches!(writes[0], GatewayCall::Approve { .. }));
    }

    #[tokio::test]
    async fn test_rejected_approval_is_classified() {
        let gateway = Arc::new(MockGateway::new().failing_approval("user rejected transaction"));
        let client = connected(&gateway);

        let err = client.execute(&request("1")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Allowance);
        assert_eq!(err.source.code(), "ACTION_REJECTED");
    }

    #[tokio::test]
    async fn test_transfer_failures_are_tagged() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_allowance(thousand())
                .failing_transfer("insufficient funds for gas * price + value"),
        );
        let err = connected(&gateway).execute(&request("1000")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Transfer);
        assert_eq!(err.source.code(), "INSUFFICIENT_FUNDS");

        let gateway = Arc::new(MockGateway::new().with_allowance(thousand()).reverting_transfer());
        let err = connected(&gateway).execute(&request("1000")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Confirm);
        assert!(err.source.tx_hash().is_some());
    }

    #[tokio::test]
    async fn test_confirmation_timeout_keeps_tx_hash() {
        let gateway = Arc::new(MockGateway::new().timing_out_transfer());

        let err = connected(&gateway).execute(&request("12.5")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Confirm);
        assert!(matches!(err.source, SwapError::Timeout { .. }));
        assert_eq!(err.source.code(), "TIMEOUT");
        assert!(err.source.tx_hash().is_some());
        assert_eq!(gateway.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_preflight_failures_stop_before_writes() {
        let paused = Arc::new(MockGateway::new().paused());
        let err = connected(&paused).execute(&request("1")).await.unwrap_err();
        assert_eq!(err.step, SwapStep::Preflight);
        assert!(matches!(err.source, SwapError::PoolPaused { .. }));
        assert!(paused.writes().is_empty());

        let unsupported = Arc::new(MockGateway::new().unsupported());
        let err = connected(&unsupported).execute(&request("1")).await.unwrap_err();
        match &err.source {
            SwapError::UnsupportedToken { symbol, network } => {
                assert_eq!(symbol, "USDC");
                assert_eq!(network, "ethereum");
            }
            other => panic!("expected UnsupportedToken, got {other:?}"),
        }
        assert!(err.to_string().contains("USDC"));
        assert!(unsupported.writes().is_empty());

        let limited = Arc::new(
            MockGateway::new().with_max_transaction_amount(U256::from(500_000_000u64)),
        );
        let err = connected(&limited).execute(&request("1000")).await.unwrap_err();
        assert!(matches!(err.source, SwapError::AmountAboveLimit { .. }));
        assert!(limited.writes().is_empty());

        assert_ok!(connected(&limited).execute(&request("500")).await);
    }

    #[tokio::test]
    async fn test_unknown_token_symbol() {
        let gateway = Arc::new(MockGateway::new());
        let client = connected(&gateway);

        let mut req = request("1");
        req.token = "DAI".to_string();
        let err = assert_err!(client.execute(&req).await);
        assert_eq!(err.step, SwapStep::Preflight);
        assert!(matches!(err.source, SwapError::UnsupportedToken { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verify_chain() {
        let gateway = Arc::new(MockGateway::new().with_chain_id(1));
        assert_ok!(connected(&gateway).verify_chain().await);

        let gateway = Arc::new(MockGateway::new().with_chain_id(56));
        let err = assert_err!(connected(&gateway).verify_chain().await);
        assert!(matches!(err, SwapError::UnsupportedChain { chain_id: 56 }));
    }

    #[tokio::test]
    async fn test_wallet_balances() {
        let gateway = Arc::new(MockGateway::new().with_wallet_balance(U256::from(42u64)));
        let balances = connected(&gateway).wallet_balances().await.unwrap();

        let symbols: Vec<_> = balances.iter().map(|b| b.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["USDC", "USDT"]);
        assert!(balances.iter().all(|b| b.balance == U256::from(42u64)));
    }

    #[test]
    fn test_step_error_display() {
        let err = StepError {
            step: SwapStep::Allowance,
            source: SwapError::WalletNotConnected,
        };
        assert_eq!(err.to_string(), "allowance step failed: Wallet not connected");
    }
}
