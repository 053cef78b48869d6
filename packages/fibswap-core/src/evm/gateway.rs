//! Chain access for the swap flow
//!
//! [`PoolGateway`] is the seam between orchestration and the chain: every
//! contract read, write and receipt lookup the swap flow needs goes through
//! it. [`EvmPoolGateway`] implements it with alloy over HTTP RPC.
//!
//! # Transaction Building
//!
//! Signing providers are built with `with_recommended_fillers()` so nonce,
//! gas limit and fee fields are populated before the wallet signs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, Log, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::{debug, info};

use crate::error::{ContractError, SwapError};
use crate::evm::contracts::{TokenPool, ERC20};
use crate::networks::Network;
use crate::swap::WalletContext;

/// Result of `estimateSendFee`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendFee {
    /// Fee payable in the chain's native token (attached as msg.value)
    pub native_fee: U256,
    /// Fee payable in the messaging layer's own token (unused)
    pub zro_fee: U256,
}

/// Arguments of a `sendTokens` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTokensCall {
    pub pool: Address,
    pub dst_chain_id: u16,
    pub to: Address,
    pub token: Address,
    pub amount: U256,
    pub refund_address: Address,
    /// Messaging fee attached as the transaction value
    pub value: U256,
}

/// Minimal receipt view used by the swap flow
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait PoolGateway: Send + Sync {
    /// Chain ID reported by the RPC endpoint
    async fn chain_id(&self) -> Result<u64, SwapError>;

    async fn calculate_fee(&self, pool: Address, amount: U256) -> Result<U256, SwapError>;

    async fn estimate_send_fee(
        &self,
        pool: Address,
        dst_chain_id: u16,
        to: Address,
        amount: U256,
    ) -> Result<SendFee, SwapError>;

    async fn is_supported(&self, pool: Address, token: Address) -> Result<bool, SwapError>;

    async fn pool_balance(&self, pool: Address, token: Address) -> Result<U256, SwapError>;

    async fn max_transaction_amount(&self, pool: Address) -> Result<U256, SwapError>;

    async fn paused(&self, pool: Address) -> Result<bool, SwapError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SwapError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError>;

    /// Submit `approve(spender, amount)`; returns once the node accepted it
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, SwapError>;

    /// Submit `sendTokens(...)` with `call.value` attached
    async fn send_tokens(&self, call: &SendTokensCall) -> Result<TxHash, SwapError>;

    /// Block until the transaction is included (or the gateway gives up)
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, SwapError>;
}

/// Alloy-backed gateway over any HTTP provider
pub struct EvmPoolGateway<P> {
    provider: P,
    /// Address of the signing wallet (None for read-only providers)
    signer: Option<Address>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl<P> EvmPoolGateway<P>
where
    P: Provider<Http<Client>> + 'static,
{
    pub fn new(provider: P, signer: Option<Address>, confirmation_timeout: Duration) -> Self {
        Self {
            provider,
            signer,
            confirmation_timeout,
            poll_interval: Duration::from_secs(2),
        }
    }

    fn require_signer(&self) -> Result<Address, SwapError> {
        self.signer.ok_or(SwapError::WalletNotConnected)
    }
}

/// Connect to `network`'s RPC endpoint
///
/// With a private key the returned gateway can sign and the wallet context is
/// connected to `network`; without one the gateway is read-only and the
/// context only carries the chain.
pub fn connect(
    network: &Network,
    private_key: Option<&str>,
    confirmation_timeout: Duration,
) -> Result<(Arc<dyn PoolGateway>, WalletContext)> {
    let rpc_url = network
        .rpc_url
        .as_deref()
        .ok_or_else(|| eyre!("{} is not set", network.rpc_env_var()))?;
    let url = rpc_url
        .parse::<url::Url>()
        .wrap_err("Invalid RPC URL")?;

    match private_key {
        Some(key) => {
            let signer: PrivateKeySigner = key.parse().wrap_err("Invalid private key")?;
            let account = signer.address();
            let provider = ProviderBuilder::new()
                .with_recommended_fillers()
                .wallet(EthereumWallet::from(signer))
                .on_http(url);

            info!(
                network = %network.key,
                chain_id = network.chain_id,
                account = %account,
                "Connected wallet gateway"
            );

            let gateway = EvmPoolGateway::new(provider, Some(account), confirmation_timeout);
            Ok((
                Arc::new(gateway),
                WalletContext::connected(account, network.chain_id),
            ))
        }
        None => {
            let provider = ProviderBuilder::new().on_http(url);

            info!(
                network = %network.key,
                chain_id = network.chain_id,
                "Connected read-only gateway"
            );

            let gateway = EvmPoolGateway::new(provider, None, confirmation_timeout);
            Ok((
                Arc::new(gateway),
                WalletContext::read_only(network.chain_id),
            ))
        }
    }
}

#[async_trait]
impl<P> PoolGateway for EvmPoolGateway<P>
where
    P: Provider<Http<Client>> + 'static,
{
    async fn chain_id(&self) -> Result<u64, SwapError> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(ContractError::normalize)?;
        Ok(chain_id)
    }

    async fn calculate_fee(&self, pool: Address, amount: U256) -> Result<U256, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let fee = contract
            .calculateFee(amount)
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(fee._0)
    }

    async fn estimate_send_fee(
        &self,
        pool: Address,
        dst_chain_id: u16,
        to: Address,
        amount: U256,
    ) -> Result<SendFee, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let fee = contract
            .estimateSendFee(dst_chain_id, to, amount, false, Bytes::new())
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(SendFee {
            native_fee: fee.nativeFee,
            zro_fee: fee.zroFee,
        })
    }

    async fn is_supported(&self, pool: Address, token: Address) -> Result<bool, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let supported = contract
            .isSupported(token)
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(supported._0)
    }

    async fn pool_balance(&self, pool: Address, token: Address) -> Result<U256, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let balance = contract
            .getTokenBalance(token)
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(balance._0)
    }

    async fn max_transaction_amount(&self, pool: Address) -> Result<U256, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let max = contract
            .maxTransactionAmount()
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(max._0)
    }

    async fn paused(&self, pool: Address) -> Result<bool, SwapError> {
        let contract = TokenPool::new(pool, &self.provider);
        let paused = contract
            .paused()
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(paused._0)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, SwapError> {
        let contract = ERC20::new(token, &self.provider);
        let balance = contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(balance._0)
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SwapError> {
        let contract = ERC20::new(token, &self.provider);
        let allowance = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(ContractError::normalize)?;
        Ok(allowance._0)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, SwapError> {
        self.require_signer()?;
        let contract = ERC20::new(token, &self.provider);

        debug!(token = %token, spender = %spender, amount = %amount, "Submitting approve");

        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(ContractError::normalize)?;
        Ok(*pending.tx_hash())
    }

    async fn send_tokens(&self, call: &SendTokensCall) -> Result<TxHash, SwapError> {
        self.require_signer()?;
        let contract = TokenPool::new(call.pool, &self.provider);

        debug!(
            pool = %call.pool,
            dst_chain_id = call.dst_chain_id,
            to = %call.to,
            token = %call.token,
            amount = %call.amount,
            value = %call.value,
            "Submitting sendTokens"
        );

        let pending = contract
            .sendTokens(
                call.dst_chain_id,
                call.to,
                call.token,
                call.amount,
                call.refund_address,
                Address::ZERO,
                Bytes::new(),
            )
            .value(call.value)
            .send()
            .await
            .map_err(ContractError::normalize)?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, SwapError> {
        let start = Instant::now();

        while start.elapsed() < self.confirmation_timeout {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ContractError::normalize(e).with_tx_hash(tx_hash))?;

            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash,
                    success: receipt.status(),
                    block_number: receipt.block_number,
                    logs: receipt
                        .inner
                        .logs()
                        .iter()
                        .map(|log| log.inner.clone())
                        .collect(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(SwapError::Timeout {
            tx_hash,
            timeout_secs: self.confirmation_timeout.as_secs(),
        })
    }
}
