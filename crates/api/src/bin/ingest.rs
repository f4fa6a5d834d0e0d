use anyhow::{Result, bail};
use api::{AppConfig, Assistant, telemetry};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scholaris-ingest")]
#[command(about = "Ingest documents into the knowledge graph")]
struct Cli {
    /// File or directory to ingest
    #[arg(short, long)]
    path: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.log)?;

    if !cli.path.exists() {
        bail!("Path not found: {}", cli.path.display());
    }

    let assistant = Assistant::from_config(&config).await?;

    if cli.path.is_dir() {
        let report = assistant.ingest_directory(&cli.path).await?;
        for failure in &report.failures {
            eprintln!("failed: {} ({})", failure.path, failure.error);
        }
        println!(
            "Ingested {} documents, {} failed",
            report.documents.len(),
            report.failures.len()
        );
    } else {
        let report = assistant.ingest_document(&cli.path).await?;
        println!(
            "Ingested {}: {} chunks, {} entities, {} relations",
            report.document_id, report.chunks, report.entities, report.relations
        );
    }

    Ok(())
}
