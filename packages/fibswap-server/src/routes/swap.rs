//! Swap widget endpoints
//!
//! - GET  /networks    - Configured networks, pools and tokens
//! - GET  /wallet      - Connected account and its token balances
//! - POST /quote       - Fee quote for a transfer
//! - POST /swap        - Run the full quote/approve/send pipeline
//! - GET  /pool/status - Pause flag, limit and balances of the wallet network's pool

use alloy::primitives::U256;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::{BigDecimal, Zero};
use fibswap_core::{
    format_units, parse_units, Approval, Quote, SwapError, SwapRequest, SwapStep, TokenBalance,
    TOKEN_DECIMALS,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::admin::{NewTransaction, TxStatus};
use crate::error::ApiError;
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/networks", get(list_networks))
        .route("/wallet", get(wallet))
        .route("/quote", post(quote))
        .route("/swap", post(swap))
        .route("/pool/status", get(pool_status))
}

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub symbol: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct NetworkDto {
    pub key: String,
    pub name: String,
    pub chain_id: u64,
    pub messaging_chain_id: u16,
    pub pool_address: String,
    pub tokens: Vec<TokenDto>,
}

#[derive(Debug, Serialize)]
pub struct NetworksResponse {
    pub networks: Vec<NetworkDto>,
    pub fee_manager: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub symbol: String,
    pub token: String,
    pub balance: String,
}

impl From<TokenBalance> for BalanceDto {
    fn from(b: TokenBalance) -> Self {
        Self {
            symbol: b.symbol,
            token: b.token.to_string(),
            balance: format_units(b.balance, TOKEN_DECIMALS),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub connected: bool,
    pub account: Option<String>,
    pub network: Option<String>,
    pub chain_id: Option<u64>,
    pub balances: Vec<BalanceDto>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub amount: String,
    pub destination: String,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub source: String,
    pub destination: String,
    pub recipient: String,
    pub amount: String,
    pub base_fee: String,
    pub messaging_fee: String,
    pub total_fee: String,
    /// Raw messaging fee attached as transaction value
    pub messaging_fee_raw: String,
}

impl From<&Quote> for QuoteResponse {
    fn from(q: &Quote) -> Self {
        Self {
            source: q.source.clone(),
            destination: q.destination.clone(),
            recipient: q.recipient.to_string(),
            amount: q.amount_display(),
            base_fee: q.base_fee_display(),
            messaging_fee: q.messaging_fee_display(),
            total_fee: q.total_fee_display(),
            messaging_fee_raw: q.messaging_fee.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SwapBody {
    pub destination: String,
    pub token: String,
    pub amount: String,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalDto {
    /// "sufficient" or "approved"
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub token: String,
    pub quote: QuoteResponse,
    pub approval: ApprovalDto,
    /// Whether the receipt carried a TokensSent event
    pub tokens_sent: bool,
    /// Network the TokensSent event addressed, by messaging chain ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PoolStatusResponse {
    pub network: String,
    pub pool: String,
    pub paused: bool,
    /// "0" means no limit
    pub max_transaction_amount: String,
    pub balances: Vec<BalanceDto>,
}

/// Raw 6-decimal token units as an exact decimal, trailing zeros dropped
fn to_decimal(raw: U256) -> BigDecimal {
    let ten = BigInt::from(10u32);
    let mut digits = BigInt::from_bytes_be(Sign::Plus, &raw.to_be_bytes::<32>());
    let mut scale = i64::from(TOKEN_DECIMALS);
    while scale > 0 && (&digits % &ten).is_zero() {
        digits /= &ten;
        scale -= 1;
    }
    BigDecimal::new(digits, scale)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/networks
async fn list_networks(State(state): State<AppState>) -> Json<NetworksResponse> {
    let networks = state
        .registry
        .iter()
        .map(|n| NetworkDto {
            key: n.key.clone(),
            name: n.name.clone(),
            chain_id: n.chain_id,
            messaging_chain_id: n.messaging_chain_id,
            pool_address: n.pool_address.to_string(),
            tokens: n
                .tokens
                .iter()
                .map(|(symbol, address)| TokenDto {
                    symbol: symbol.clone(),
                    address: address.to_string(),
                })
                .collect(),
        })
        .collect();

    Json(NetworksResponse {
        networks,
        fee_manager: state.registry.fee_manager().to_string(),
    })
}

/// GET /api/wallet
async fn wallet(State(state): State<AppState>) -> Result<Json<WalletResponse>, ApiError> {
    let Some(client) = state.swap.as_deref() else {
        return Ok(Json(WalletResponse {
            connected: false,
            account: None,
            network: None,
            chain_id: None,
            balances: Vec::new(),
        }));
    };

    let wallet = client.wallet();
    let network = client.active_network().ok().map(|n| n.key.clone());
    let balances = if wallet.is_connected() {
        client
            .wallet_balances()
            .await?
            .into_iter()
            .map(BalanceDto::from)
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(WalletResponse {
        connected: wallet.is_connected(),
        account: wallet.account.map(|a| a.to_string()),
        network,
        chain_id: wallet.chain_id,
        balances,
    }))
}

/// POST /api/quote
async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let client = state.swap_client()?;

    match client
        .quote(&req.amount, &req.destination, req.recipient.as_deref())
        .await
    {
        Ok(quote) => {
            state.metrics.quotes_total.inc();
            Ok(Json(QuoteResponse::from(&quote)))
        }
        Err(e) => {
            state.metrics.quote_failure(e.is_validation());
            warn!(
                destination = %req.destination,
                amount = %req.amount,
                code = e.code(),
                error = %e,
                "Quote failed"
            );
            Err(e.into())
        }
    }
}

/// POST /api/swap
async fn swap(
    State(state): State<AppState>,
    Json(body): Json<SwapBody>,
) -> Result<Json<SwapResponse>, ApiError> {
    let client = state.swap_client()?;
    let source = client.active_network().ok().map(|n| n.key.clone());

    let request = SwapRequest {
        destination: body.destination.clone(),
        token: body.token.to_uppercase(),
        amount: body.amount.clone(),
        recipient: body.recipient.clone(),
    };

    let outcome = match client.execute(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state
                .metrics
                .swaps_failed_total
                .with_label_values(&[e.step.as_str()])
                .inc();

            // A transfer that reached the chain is logged even when it failed.
            // Only a revert is final; a timeout or RPC error may still be mined.
            if let (SwapStep::Confirm, Some(tx_hash), Some(source), Ok(raw)) = (
                e.step,
                e.source.tx_hash(),
                source,
                parse_units(&request.amount, TOKEN_DECIMALS),
            ) {
                let status = match e.source {
                    SwapError::TransactionReverted { .. } => TxStatus::Failed,
                    _ => TxStatus::Pending,
                };
                state.metrics.swaps_submitted_total.inc();
                let mut admin = state.admin.write().await;
                let record = admin.record_transaction(NewTransaction {
                    hash: Some(tx_hash.to_string()),
                    source,
                    destination: request.destination.clone(),
                    token: request.token.clone(),
                    amount: to_decimal(raw),
                    status,
                });
                info!(id = record.id, tx_hash = %tx_hash, status = ?status, "Unconfirmed transfer recorded");
            }
            return Err(e.into());
        }
    };

    if matches!(outcome.approval, Approval::Approved { .. }) {
        state.metrics.approvals_total.inc();
    }
    state.metrics.swaps_submitted_total.inc();
    state.metrics.swaps_confirmed_total.inc();

    {
        let mut admin = state.admin.write().await;
        admin.record_transaction(NewTransaction {
            hash: Some(outcome.transfer.tx_hash.to_string()),
            source: outcome.transfer.source.clone(),
            destination: outcome.transfer.destination.clone(),
            token: request.token.clone(),
            amount: to_decimal(outcome.quote.amount),
            status: TxStatus::Completed,
        });
    }

    info!(
        tx_hash = %outcome.transfer.tx_hash,
        source = %outcome.transfer.source,
        destination = %outcome.transfer.destination,
        amount = %outcome.quote.amount_display(),
        "Swap recorded"
    );

    let approval = match outcome.approval {
        Approval::Sufficient { .. } => ApprovalDto {
            status: "sufficient",
            tx_hash: None,
        },
        Approval::Approved { tx_hash } => ApprovalDto {
            status: "approved",
            tx_hash: Some(tx_hash.to_string()),
        },
    };

    let sent_to = outcome
        .receipt
        .sent
        .as_ref()
        .and_then(|event| state.registry.by_messaging_chain_id(event.dst_chain_id))
        .map(|network| network.key.clone());

    Ok(Json(SwapResponse {
        tx_hash: outcome.transfer.tx_hash.to_string(),
        block_number: outcome.receipt.block_number,
        token: request.token,
        quote: QuoteResponse::from(&outcome.quote),
        approval,
        tokens_sent: outcome.receipt.sent.is_some(),
        sent_to,
    }))
}

/// GET /api/pool/status
async fn pool_status(State(state): State<AppState>) -> Result<Json<PoolStatusResponse>, ApiError> {
    let client = state.swap_client()?;
    let status = client.pool_status().await?;

    Ok(Json(PoolStatusResponse {
        network: status.network,
        pool: status.pool.to_string(),
        paused: status.paused,
        max_transaction_amount: format_units(status.max_transaction_amount, TOKEN_DECIMALS),
        balances: status.balances.into_iter().map(BalanceDto::from).collect(),
    }))
}
