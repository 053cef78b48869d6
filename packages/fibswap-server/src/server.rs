//! HTTP server: shared state, router and health/metrics endpoints

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use eyre::eyre;
use fibswap_core::{NetworkRegistry, SwapClient, SwapError};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::admin::AdminStore;
use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::routes;

pub type SharedAdmin = Arc<RwLock<AdminStore>>;
pub type SharedMetrics = Arc<Metrics>;

/// Combined app state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NetworkRegistry>,
    /// `None` when no RPC endpoint is configured for the wallet network
    pub swap: Option<Arc<SwapClient>>,
    pub admin: SharedAdmin,
    pub metrics: SharedMetrics,
    pub started_at: Instant,
}

impl AppState {
    /// State with a freshly seeded admin store
    pub fn new(registry: Arc<NetworkRegistry>, swap: Option<Arc<SwapClient>>) -> Self {
        let admin = AdminStore::seeded(&registry);
        Self {
            registry,
            swap,
            admin: Arc::new(RwLock::new(admin)),
            metrics: Arc::new(Metrics::new()),
            started_at: Instant::now(),
        }
    }

    /// The swap client, or "wallet not connected"
    pub fn swap_client(&self) -> Result<&SwapClient, ApiError> {
        self.swap
            .as_deref()
            .ok_or_else(|| ApiError::from(SwapError::WalletNotConnected))
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub wallet_connected: bool,
    pub network: Option<String>,
    pub uptime_seconds: u64,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (wallet_connected, network) = match state.swap.as_deref() {
        Some(client) => (
            client.wallet().is_connected(),
            client.active_network().ok().map(|n| n.key.clone()),
        ),
        None => (false, None),
    };

    Json(HealthResponse {
        status: "healthy",
        wallet_connected,
        network,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Liveness probe
async fn liveness() -> &'static str {
    "OK"
}

async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api", routes::router())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(
    bind_address: &str,
    port: u16,
    state: AppState,
    shutdown: F,
) -> eyre::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| eyre!("Invalid bind address {}:{}: {}", bind_address, port, e))?;
    info!("API server listening on {}", addr);
    info!("  /health  - Health status (JSON)");
    info!("  /metrics - Prometheus metrics");
    info!("  /api/*   - Swap and admin endpoints");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
