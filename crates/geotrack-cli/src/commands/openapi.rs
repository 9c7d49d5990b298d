use clap::Args;
use geotrack_locations::LocationsApiDoc;
use std::path::PathBuf;
use tracing::info;
use utoipa::OpenApi;

/// Print the OpenAPI document of the ingestion API
#[derive(Args)]
pub struct OpenApiCommand {
    /// Write to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long, default_value = "false")]
    pub compact: bool,
}

impl OpenApiCommand {
    pub fn render(&self) -> anyhow::Result<String> {
        let doc = LocationsApiDoc::openapi();
        let json = if self.compact {
            doc.to_json()?
        } else {
            doc.to_pretty_json()?
        };
        Ok(json)
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let json = self.render()?;
        match self.output {
            Some(ref path) => {
                std::fs::write(path, json)?;
                info!("OpenAPI document written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}
