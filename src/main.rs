use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use annotation_api::{
    clock::{Clock, SystemClock},
    config::{self, Environment},
    database::{DatabaseManager, PgStore},
    rate_limit::{spawn_sweeper, RateLimiter},
    services::{AnnotationService, ServiceSettings},
    storage::{LocalBucket, UrlSigner},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "annotation_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::config();
    tracing::info!("Starting Annotation API in {:?} mode", config.environment);

    if config.storage.signing_secret.is_empty() {
        if !matches!(config.environment, Environment::Development) {
            anyhow::bail!("STORAGE_SIGNING_SECRET must be set outside development");
        }
        tracing::warn!("Using an empty upload signing secret");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;

    let signer = UrlSigner::new(
        config.server.public_base_url.clone(),
        config.storage.signing_secret.clone(),
        clock.clone(),
    );
    let bucket = LocalBucket::open(&config.storage.bucket_dir, signer)
        .await
        .context("failed to open image bucket")?;

    let limits = config.rate_limit_config();
    tracing::info!(
        enabled = limits.enabled,
        general = limits.general.max_requests,
        upload = limits.upload.max_requests,
        chat = limits.chat.max_requests,
        "Rate limits configured"
    );
    let limiter = Arc::new(RateLimiter::new(limits, clock.clone()));
    let sweeper = spawn_sweeper(limiter.clone(), config.sweep_interval());

    let service = AnnotationService::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(bucket),
        limiter,
        ServiceSettings {
            frontend_url: config.sharing.frontend_url.clone(),
            upload_url_ttl: Duration::from_secs(config.storage.upload_url_ttl_secs),
            max_upload_bytes: config.storage.max_upload_bytes,
        },
    );

    let app = annotation_api::app(AppState::new(service), &config.security);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(address = %bind_addr, "Annotation API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
