use clap::Args;
use colored::Colorize;
use geotrack_client::{ApiClient, ClientConfig, HealthStatus};
use geotrack_client::config::DEFAULT_SERVER_URL;
use std::time::Duration;
use tracing::debug;

/// Query a running server's health endpoint
#[derive(Args)]
pub struct HealthCommand {
    /// Server root; the API version segment is appended
    #[arg(long, default_value = DEFAULT_SERVER_URL, env = "API_SERVER_URL")]
    pub server_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

impl HealthCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let config =
            ClientConfig::new(&self.server_url).with_timeout(Duration::from_secs(self.timeout));
        debug!("Checking health of {}", config.server_url);

        let client = ApiClient::new(config)?;
        let report = client.health_report().await?;

        match report.status {
            HealthStatus::Healthy => {
                println!("{} at {}", "healthy".green().bold(), report.timestamp);
                Ok(())
            }
            HealthStatus::Unhealthy => {
                println!("{} at {}", "unhealthy".red().bold(), report.timestamp);
                anyhow::bail!("{} reported unhealthy", client.server_url())
            }
        }
    }
}
