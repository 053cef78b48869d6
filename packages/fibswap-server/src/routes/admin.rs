//! Admin dashboard endpoints
//!
//! All mutations act on the in-memory [`AdminStore`](crate::admin::AdminStore)
//! and never submit transactions.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::admin::{self, FeeRecord, PoolRecord, PoolStats, TransactionRecord, TxStatus};
use crate::error::ApiError;
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools", get(list_pools))
        .route("/pools/{id}/liquidity/add", post(add_liquidity))
        .route("/pools/{id}/liquidity/remove", post(remove_liquidity))
        .route("/pools/{id}/max-swap", put(update_max_swap))
        .route("/fees", get(list_fees))
        .route("/fees/{id}", put(update_fees))
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}/status", put(update_transaction_status))
        .route("/stats", get(pool_stats))
}

#[derive(Debug, Deserialize)]
pub struct AmountBody {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeUpdateBody {
    pub base_fee_percent: String,
    pub discounted_fee_percent: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: TxStatus,
}

#[derive(Debug, Serialize)]
pub struct PoolsResponse {
    pub pools: Vec<PoolRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FeesResponse {
    pub fees: Vec<FeeRecord>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub networks: Vec<PoolStats>,
}

fn parse_decimal(field: &str, value: &str) -> Result<BigDecimal, ApiError> {
    admin::parse_decimal(value)
        .map_err(|e| ApiError::bad_request(format!("{}: {}", field, e)).with_code("INVALID_DECIMAL"))
}

/// GET /api/admin/pools
async fn list_pools(State(state): State<AppState>) -> Json<PoolsResponse> {
    let admin = state.admin.read().await;
    let pools = admin.pools().to_vec();
    Json(PoolsResponse {
        count: pools.len(),
        pools,
    })
}

/// POST /api/admin/pools/{id}/liquidity/add
async fn add_liquidity(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<AmountBody>,
) -> Result<Json<PoolRecord>, ApiError> {
    let amount = parse_decimal("amount", &body.amount)?;
    let pool = state.admin.write().await.add_liquidity(id, &amount)?.clone();
    state.metrics.admin_action("add_liquidity");
    Ok(Json(pool))
}

/// POST /api/admin/pools/{id}/liquidity/remove
async fn remove_liquidity(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<AmountBody>,
) -> Result<Json<PoolRecord>, ApiError> {
    let amount = parse_decimal("amount", &body.amount)?;
    let pool = state
        .admin
        .write()
        .await
        .remove_liquidity(id, &amount)?
        .clone();
    state.metrics.admin_action("remove_liquidity");
    Ok(Json(pool))
}

/// PUT /api/admin/pools/{id}/max-swap
async fn update_max_swap(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<AmountBody>,
) -> Result<Json<PoolRecord>, ApiError> {
    let amount = parse_decimal("amount", &body.amount)?;
    let pool = state
        .admin
        .write()
        .await
        .update_max_swap(id, &amount)?
        .clone();
    state.metrics.admin_action("update_max_swap");
    Ok(Json(pool))
}

/// GET /api/admin/fees
async fn list_fees(State(state): State<AppState>) -> Json<FeesResponse> {
    let fees = state.admin.read().await.fees().to_vec();
    Json(FeesResponse { fees })
}

/// PUT /api/admin/fees/{id}
async fn update_fees(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<FeeUpdateBody>,
) -> Result<Json<FeeRecord>, ApiError> {
    let base = parse_decimal("base_fee_percent", &body.base_fee_percent)?;
    let discounted = parse_decimal("discounted_fee_percent", &body.discounted_fee_percent)?;

    let fee = state
        .admin
        .write()
        .await
        .update_fees(id, &base, &discounted)?
        .clone();
    state.metrics.admin_action("update_fees");
    Ok(Json(fee))
}

/// GET /api/admin/transactions
async fn list_transactions(State(state): State<AppState>) -> Json<TransactionsResponse> {
    let transactions: Vec<TransactionRecord> = state
        .admin
        .read()
        .await
        .transactions()
        .into_iter()
        .cloned()
        .collect();
    Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    })
}

/// PUT /api/admin/transactions/{id}/status
async fn update_transaction_status(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(body): Json<StatusBody>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let tx = state
        .admin
        .write()
        .await
        .set_status(id, body.status)?
        .clone();
    state.metrics.admin_action("update_transaction_status");
    Ok(Json(tx))
}

/// GET /api/admin/stats
async fn pool_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let networks = state.admin.read().await.pool_stats();
    Json(StatsResponse { networks })
}
