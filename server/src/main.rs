//! Campus HTTP server.
//!
//! Order validation and course video uploads behind bearer-token auth.

use anyhow::Context;
use campus_auth::providers::{ProfileDirectory, RateLimiter};
use campus_auth::stores::{
    BaasIdentityProvider, PostgresProfileDirectory, PostgresRateLimiter, RedisRateLimiter,
};
use campus_commerce::OrderService;
use campus_commerce::stores::{PostgresCatalog, PostgresOrderRepository};
use campus_core::environment::{Clock, SystemClock};
use campus_media::{StreamClient, UploadBroker};
use campus_server::config::{Config, RateLimitBackend};
use campus_server::metrics::register_business_metrics;
use campus_server::{AppState, build_router, cors_layer};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_server=debug,sqlx=warn,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Campus HTTP Server");

    let config = Config::from_env();
    info!(
        bind = %config.bind_address(),
        rate_limit_backend = %config.rate_limit.backend,
        currency = %config.shop.currency,
        "Configuration loaded"
    );

    // Metrics exporter
    let metrics_addr: SocketAddr = config
        .metrics_address()
        .parse()
        .context("Invalid metrics address")?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    register_business_metrics();
    info!(%metrics_addr, "Metrics exporter listening");

    // Database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database connected and migrated");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Identity
    let profiles: Arc<dyn ProfileDirectory> = Arc::new(PostgresProfileDirectory::with_clock(
        pool.clone(),
        clock.clone(),
    ));
    let identity = Arc::new(BaasIdentityProvider::new(
        config.baas.url.clone(),
        config.baas.anon_key.clone(),
        Duration::from_secs(config.baas.timeout),
        profiles.clone(),
    )?);

    // Rate limiting
    let postgres_limiter = PostgresRateLimiter::with_clock(pool.clone(), clock.clone());
    let mut purge_task = None;
    let rate_limiter: Arc<dyn RateLimiter> =
        match (config.rate_limit.backend, config.redis.url.as_deref()) {
            (RateLimitBackend::Redis, Some(url)) => {
                info!("Connecting to Redis rate limiter...");
                Arc::new(RedisRateLimiter::new(url).await?)
            }
            (backend, _) => {
                if backend == RateLimitBackend::Redis {
                    warn!("RATE_LIMIT_BACKEND=redis but REDIS_URL is unset, using PostgreSQL");
                }
                purge_task = Some(spawn_purge_task(
                    postgres_limiter.clone(),
                    config.purge_interval(),
                ));
                Arc::new(postgres_limiter)
            }
        };

    // Services
    let orders = OrderService::new(
        Arc::new(PostgresCatalog::new(pool.clone())),
        Arc::new(PostgresOrderRepository::new(pool.clone())),
        profiles,
        clock,
        config.pricing(),
    );
    let uploads = UploadBroker::new(
        Arc::new(StreamClient::new(config.stream_config())?),
        config.upload_limits(),
    );

    let state = AppState::new(
        identity,
        rate_limiter,
        orders,
        uploads,
        config.order_rate_limit(),
    );
    let app = build_router(state).layer(cors_layer(&config.server.cors_origins));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "Server listening");

    // Serve until a signal arrives, then give in-flight requests the
    // configured grace period.
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(());
    })
    .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout);
    tokio::select! {
        result = server => result.context("Server error")?,
        () = async move {
            let _ = stop_rx.await;
            tokio::time::sleep(grace).await;
        } => warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out"),
    }

    if let Some(purge) = purge_task {
        purge.abort();
    }

    info!("Server stopped");
    Ok(())
}

/// Periodically delete expired `rate_limits` rows.
fn spawn_purge_task(limiter: PostgresRateLimiter, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match limiter.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => {
                    metrics::counter!("campus_rate_limit_purged_total").increment(purged);
                    info!(purged, "Purged expired rate limit windows");
                }
                Err(e) => error!(error = %e, "Failed to purge rate limit windows"),
            }
        }
    })
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
