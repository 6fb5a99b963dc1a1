//! Train command - one full pipeline run per process

use clap::Args;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::search::SearchContext;

#[derive(Args, Clone, Debug)]
pub struct TrainArgs {
    /// Raw CSV location (overrides `ingestion.raw_data_uri`)
    #[arg(long)]
    pub uri: Option<String>,

    /// Skip the registry and the run pointer
    #[arg(long)]
    pub no_register: bool,

    /// Search budget in seconds (overrides `training.deadline_secs`)
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

pub async fn run(args: TrainArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    let uri = apply_overrides(&mut config, &args);

    let orchestrator = crate::create_training_orchestrator(&config)?;
    let ctx = search_context(&config);

    let cancel = ctx.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling search");
            cancel.cancel();
        }
    });

    let result = orchestrator.run(&uri, &ctx).await;
    watcher.abort();
    let persisted = result?;

    info!(
        run_id = %persisted.run_id,
        best_params = %persisted.best_params,
        cv_rmse = cv_rmse(persisted.best_score),
        test_rmse = persisted.test_rmse,
        iterations = persisted.iterations.len(),
        model_uri = ?persisted.registered.as_ref().map(|m| m.uri.to_string()),
        pointer = ?persisted.pointer_file,
        "Training finished"
    );

    Ok(())
}

/// The search ranks by negated MSE
fn cv_rmse(best_score: f64) -> f64 {
    (-best_score).max(0.0).sqrt()
}

fn apply_overrides(config: &mut AppConfig, args: &TrainArgs) -> String {
    if args.no_register {
        config.training.register = false;
    }
    if args.deadline_secs.is_some() {
        config.training.deadline_secs = args.deadline_secs;
    }
    args.uri
        .clone()
        .unwrap_or_else(|| config.ingestion.raw_data_uri.clone())
}

fn search_context(config: &AppConfig) -> SearchContext {
    match config.training.deadline() {
        Some(budget) => SearchContext::new().with_timeout(budget),
        None => SearchContext::new(),
    }
}
