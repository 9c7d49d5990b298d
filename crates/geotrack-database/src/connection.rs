//! Database connection management

use geotrack_core::{DatabaseConfig, ServiceError, ServiceResult};
use geotrack_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tracing::{debug, info};

pub type DbConnection = DatabaseConnection;

pub async fn establish_connection(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    connect_with(opt).await
}

/// Connect with caller-supplied options and bring the schema up to date.
pub async fn connect_with(options: ConnectOptions) -> ServiceResult<Arc<DbConnection>> {
    let db = Database::connect(options)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;
    debug!("Database connection established");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;
    info!("Database migrations applied");

    Ok(Arc::new(db))
}
