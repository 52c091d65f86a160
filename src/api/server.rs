use anyhow::Context;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

use crate::storage::{CoreStore, Repository};

/// Serve `router` until `shutdown` resolves, then stop the repository.
///
/// The repository is stopped even when the server exits with an error, so
/// the in-memory snapshot is always written. The server error wins over a
/// stop error.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    repository: &Repository,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "Server exited with an error");
    }

    info!("Server stopped, flushing storage...");
    let stopped = repository.stop().await;
    if let Err(e) = &stopped {
        tracing::error!(error = %e, "Failed to stop storage");
    }

    served.context("server error")?;
    stopped.context("failed to stop storage")?;
    info!("Storage stopped");
    Ok(())
}
