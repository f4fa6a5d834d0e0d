use anyhow::{Context, Result};
use api::{AppConfig, Assistant, routes, telemetry};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scholaris-api")]
#[command(about = "Serve the Scholaris knowledge-graph assistant over HTTP")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.log)?;

    let assistant = Assistant::from_config(&config).await?;
    let app = routes::router(Arc::new(assistant));

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!(address = %address, "server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
