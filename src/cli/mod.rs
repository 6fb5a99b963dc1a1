//! CLI module for the podcast listening-time predictor
//!
//! Subcommands:
//! - `serve`: prediction form and probes
//! - `ingest`: fetch the raw CSV and persist the train/test split
//! - `train`: full training run through to a new run pointer
//! - `drift`: compare the request log with the training split
//! - `init-db`: create the request log tables

pub mod drift;
pub mod ingest;
pub mod init_db;
pub mod serve;
pub mod train;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Podcast listening-time predictor
#[derive(Parser)]
#[command(name = "podcast-predictor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the prediction form
    Serve(serve::ServeArgs),

    /// Fetch raw data and write the train/test split
    Ingest(ingest::IngestArgs),

    /// Run the training pipeline
    Train(train::TrainArgs),

    /// Run drift detection over the request log
    Drift(drift::DriftArgs),

    /// Create the request log tables
    InitDb,
}

/// `.env`, layered config, then logging; shared by every subcommand
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
