//! Purchases Service Binary
//!
//! Serves the purchase transaction API over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use purchases_fx::{ExchangeRateProvider, TreasuryRateSource};
use purchases_service::{router, AppState, RateLimiterGate, ServiceConfig, TransactionService};
use purchases_store::{InMemoryTransactionStore, PgTransactionStore, TransactionStore};

const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting purchases service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = build_store(&config).await?;

    let source = Arc::new(TreasuryRateSource::new(config.treasury_config())?);
    let provider = Arc::new(ExchangeRateProvider::new(source, config.provider_config()));
    info!(
        source = provider.source_name(),
        base_url = %config.rates.treasury_base_url,
        lookback_months = config.rates.lookback_months,
        "Exchange rate provider ready"
    );

    let service = Arc::new(TransactionService::new(
        store,
        provider,
        config.service_config(),
    ));
    let cleanup = service.spawn_cache_cleanup(CACHE_CLEANUP_INTERVAL);

    let gate = Arc::new(RateLimiterGate::new(config.rate_limiter.clone()));
    let app = router(AppState::new(service, gate));

    let address = format!("{}:{}", config.listen_addr, config.listen_port);
    let listener = TcpListener::bind(&address).await?;
    info!(
        listen_addr = %config.listen_addr,
        listen_port = config.listen_port,
        rate_limit = config.rate_limiter.limit_for_period,
        "Purchases service running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    info!("Purchases service shutdown complete");
    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
async fn build_store(config: &ServiceConfig) -> anyhow::Result<Arc<dyn TransactionStore>> {
    match &config.store.database_url {
        Some(url) => {
            let store = PgTransactionStore::connect_lazy(
                url,
                config.store.max_connections,
                config.store.timeout,
            )?;
            store.ensure_schema().await?;
            info!(max_connections = config.store.max_connections, "Using PostgreSQL store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, transactions are kept in memory only");
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
    }
}

/// Completes on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => info!("Shutdown signal received"),
        () = terminate => info!("Terminate signal received"),
    }
}
