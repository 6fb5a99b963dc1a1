//! Drift command - batch check of the request log

use clap::Args;
use tracing::info;

#[derive(Args, Clone, Debug)]
pub struct DriftArgs {
    /// Print the report without writing it
    #[arg(long)]
    pub no_save: bool,
}

pub async fn run(args: DriftArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let service = crate::create_drift_service(&config).await?;
    let report = service.run(!args.no_save).await?;

    for column in &report.columns {
        info!(
            column = %column.column,
            test = ?column.stat_test,
            statistic = column.statistic,
            threshold = column.threshold,
            drifted = column.drift_detected,
            "Column drift"
        );
    }
    info!(
        name = %report.name,
        drifted_columns = report.drifted_columns,
        share = report.share_of_drifted_columns,
        dataset_drift = report.dataset_drift,
        saved = !args.no_save,
        "Drift detection finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
