use geotrack_database::DbConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
        Err(e) => {
            warn!("Failed to listen for ctrl-c signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Close the pool once the server no longer holds it, bounded by `timeout`.
pub async fn close_database(db: Arc<DbConnection>, timeout: Duration) {
    let db = match Arc::try_unwrap(db) {
        Ok(db) => db,
        Err(_) => {
            debug!("Database still shared, leaving pool to drop");
            return;
        }
    };

    match tokio::time::timeout(timeout, db.close()).await {
        Ok(Ok(())) => info!("Database connections closed"),
        Ok(Err(e)) => warn!("Failed to close database connections: {}", e),
        Err(_) => warn!(
            "Cleanup timeout exceeded ({:?}), forcing shutdown",
            timeout
        ),
    }
}
