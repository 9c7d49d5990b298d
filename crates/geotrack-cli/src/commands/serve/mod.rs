mod shutdown;

use anyhow::Context;
use clap::Args;
use geotrack_core::{AuthConfig, DatabaseConfig, IngestConfig, SuccessStatus};
use geotrack_database::establish_connection;
use geotrack_locations::{build_router, LocationsAppState, SeaOrmLocationStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:8000", env = "GEOTRACK_ADDRESS")]
    pub address: String,

    /// Database connection URL (postgres:// or sqlite://)
    #[arg(long, env = "GEOTRACK_DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[arg(long, default_value_t = 100, env = "GEOTRACK_DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Path the API is mounted under; empty mounts at the root
    #[arg(long, default_value = "/v1", env = "GEOTRACK_BASE_PATH")]
    pub base_path: String,

    /// Status returned when a batch is stored (200 or 201)
    #[arg(
        long,
        default_value_t = 201,
        env = "GEOTRACK_SUCCESS_STATUS",
        value_parser = clap::value_parser!(u16).range(200..=201)
    )]
    pub success_status: u16,

    /// Reject batches that carry no API key
    #[arg(long, env = "GEOTRACK_REQUIRE_API_KEY")]
    pub require_api_key: bool,

    /// Accepted API key; repeat or comma-separate for several
    #[arg(long = "api-key", env = "GEOTRACK_API_KEYS", value_delimiter = ',')]
    pub api_keys: Vec<String>,

    /// Seconds to wait for the database pool to close on shutdown
    #[arg(long, default_value_t = 10, env = "GEOTRACK_SHUTDOWN_TIMEOUT")]
    pub shutdown_timeout: u64,
}

impl ServeCommand {
    pub fn ingest_config(&self) -> anyhow::Result<IngestConfig> {
        let success_status = SuccessStatus::from_u16(self.success_status)
            .with_context(|| format!("Unsupported success status {}", self.success_status))?;

        let api_keys: Vec<String> = self
            .api_keys
            .iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();

        if self.require_api_key && api_keys.is_empty() {
            warn!("API keys are required but none are configured; any presented key is accepted");
        }

        Ok(IngestConfig {
            success_status,
            auth: AuthConfig {
                require_api_key: self.require_api_key,
                api_keys,
            },
        })
    }

    pub fn database_config(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::new(self.database_url.clone());
        config.max_connections = self.max_connections;
        config.min_connections = config.min_connections.min(self.max_connections);
        config
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let ingest_config = self.ingest_config()?;

        debug!("Initializing database connection...");
        let db = establish_connection(&self.database_config())
            .await
            .context("Failed to connect to the database")?;

        let store = Arc::new(SeaOrmLocationStore::new(db.clone()));
        let state = Arc::new(LocationsAppState::new(store, ingest_config));
        let app = build_router(state, &self.base_path);

        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind {}", self.address))?;
        info!(
            "Geotrack API listening on {} (mounted at '{}')",
            self.address, self.base_path
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::ctrl_c())
            .await?;

        shutdown::close_database(db, Duration::from_secs(self.shutdown_timeout)).await;
        info!("Geotrack API server exited");
        Ok(())
    }
}
