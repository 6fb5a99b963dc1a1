//! Ingest command - persist the train/test split only

use clap::Args;
use tracing::info;

#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    /// Raw CSV location (overrides `ingestion.raw_data_uri`)
    #[arg(long)]
    pub uri: Option<String>,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let uri = args.uri.unwrap_or_else(|| config.ingestion.raw_data_uri.clone());

    let orchestrator = crate::create_training_orchestrator(&config)?;
    let ingested = orchestrator
        .ingest(&uri)
        .await
        .map_err(|e| e.with_context("ingest"))?;

    info!(
        run_id = ingested.run_id(),
        train_rows = ingested.split().train.len(),
        test_rows = ingested.split().test.len(),
        "Ingestion finished"
    );

    Ok(())
}
