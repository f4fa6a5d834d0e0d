use anyhow::Result;
use api::{AppConfig, telemetry};
use clap::Parser;
use graph::{GraphBuilder, GraphStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scholaris-setup")]
#[command(about = "Create the graph indexes used by Scholaris")]
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

    let store = graph::connect(&config.neo4j, &config.graph).await?;
    let backend = store.backend();

    let created = GraphBuilder::new(store).create_indexes().await;
    println!(
        "Ensured {}/{} indexes on {}",
        created,
        extract::EntityType::ALL.len(),
        backend
    );

    Ok(())
}
