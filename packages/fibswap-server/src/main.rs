//! FibSwap Server
//!
//! HTTP front end for FibSwapDex cross-chain stablecoin transfers.
//!
//! # Wallet
//!
//! The signing wallet is configured with `WALLET_PRIVATE_KEY` on
//! `WALLET_NETWORK`. Without a key the server still reads pool state over
//! `<NETWORK>_RPC_URL` but every swap action fails with "wallet not
//! connected". Without an RPC URL for the wallet network only the network
//! table and admin endpoints are useful.

use std::sync::Arc;

use eyre::WrapErr;
use fibswap_core::evm::gateway::connect;
use fibswap_core::{NetworkRegistry, SwapClient};
use fibswap_server::config::{self, Config};
use fibswap_server::server::{start_server, AppState};
use tracing::{info, warn};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        // logging is not up yet
        eprintln!("Loaded .env from {:?}", path);
    }
    init_logging();

    info!("Starting FibSwap server");

    let registry = NetworkRegistry::mainnet();
    let config = Config::load(&registry)?;
    let registry = Arc::new(registry.with_rpc_urls(&config.rpc_urls)?);

    info!(
        bind = %config.bind_address,
        port = config.api_port,
        wallet_network = %config.wallet_network,
        wallet_key = ?config.wallet_private_key,
        rpc_networks = ?config.rpc_urls.keys().collect::<Vec<_>>(),
        "Configuration loaded"
    );

    let swap = build_swap_client(&config, &registry).await?;
    let state = AppState::new(registry, swap);

    start_server(
        &config.bind_address,
        config.api_port,
        state,
        wait_for_shutdown_signal(),
    )
    .await?;

    info!("FibSwap server stopped");
    Ok(())
}

async fn build_swap_client(
    config: &Config,
    registry: &Arc<NetworkRegistry>,
) -> eyre::Result<Option<Arc<SwapClient>>> {
    let network = registry
        .get(&config.wallet_network)
        .ok_or_else(|| eyre::eyre!("Unknown wallet network {}", config.wallet_network))?;

    if network.rpc_url.is_none() {
        warn!(
            network = %network.key,
            "{} not set, swap endpoints will report wallet not connected",
            network.rpc_env_var()
        );
        return Ok(None);
    }

    let private_key = config
        .wallet_private_key
        .as_ref()
        .map(|key| key.expose().as_str());
    let (gateway, wallet) = connect(network, private_key, config.confirmation_timeout())?;

    let client = SwapClient::new(gateway, Arc::clone(registry), wallet);
    client
        .verify_chain()
        .await
        .wrap_err_with(|| format!("RPC endpoint for {} serves the wrong chain", network.key))?;

    Ok(Some(Arc::new(client)))
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fibswap_server=debug,fibswap_core=debug"));

    if config::json_logging() {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}
