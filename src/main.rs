use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use snip::api::{self, AppState, AuthKeys};
use snip::audit::AuditHub;
use snip::config::Config;
use snip::service::LinkService;
use snip::storage::{CoreStore, Repository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;
    snip::logging::init(&config.log_level);
    info!("Loaded configuration");

    // Initialize storage
    let repository = Arc::new(Repository::new(
        config.storage.database_url.as_deref(),
        config.storage.max_connections,
        config.storage.snapshot_path.clone(),
    )?);
    repository
        .start()
        .await
        .context("failed to start storage")?;

    let service = Arc::new(LinkService::new(Arc::clone(&repository)));
    service
        .start()
        .await
        .context("failed to recover code counter")?;

    let audit = Arc::new(AuditHub::from_config(&config.audit)?);
    if audit.is_empty() {
        info!("Audit disabled - no sinks configured");
    }

    if config.auth.secret.is_none() {
        tracing::warn!("SECRET_KEY not set - auth cookies will not survive a restart");
    }
    let keys = Arc::new(AuthKeys::new(config.auth.secret.as_deref()));

    let router = api::create_router(Arc::new(AppState {
        service,
        audit,
        keys,
        base_url: config.server.base_url.clone(),
    }));

    let listener = tokio::net::TcpListener::bind(&config.server.address).await?;
    info!("🚀 Server listening on http://{}", config.server.address);
    info!("   - Short URLs returned as {}<code>", config.server.base_url);

    api::serve(listener, router, &repository, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
