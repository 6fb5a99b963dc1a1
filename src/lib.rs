//! Podcast listening-time predictor
//!
//! Trains a regressor on episode metadata and serves single-record
//! predictions:
//! - ingestion and a seeded train/test split
//! - feature derivation plus a persisted preprocessing transform
//! - successive-halving model search with a model registry
//! - a request log and batch drift detection against the training split

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use config::RegistryBackend;
use domain::drift::DriftDetector;
use domain::registry::{ModelRegistry, RunParamsStore};
use domain::storage::ArtifactStore;
use domain::DomainError;
use infrastructure::{
    dataset::{CsvDatasetSource, CsvDatasetStore},
    registry::{FsModelRegistry, FsRunParamsStore, HttpModelRegistry},
    request_log::SqliteRequestStore,
    services::{DriftService, PredictionService, TrainingDeps, TrainingOrchestrator, TrainingSettings},
    storage::FsArtifactStore,
};

/// Artifact tree rooted at `artifacts.root`
pub fn create_artifact_store(config: &AppConfig) -> Arc<dyn ArtifactStore> {
    Arc::new(FsArtifactStore::new(config.artifacts.root.clone()))
}

pub fn create_model_registry(
    config: &AppConfig,
    store: Arc<dyn ArtifactStore>,
) -> Result<Arc<dyn ModelRegistry>, DomainError> {
    let registry: Arc<dyn ModelRegistry> = match config.registry.backend {
        RegistryBackend::Fs => {
            info!(root = %config.registry.root, "Using filesystem model registry");
            Arc::new(FsModelRegistry::new(store, config.registry.root.clone()))
        }
        RegistryBackend::Http => {
            info!(base_url = %config.registry.base_url, "Using remote model registry");
            Arc::new(HttpModelRegistry::new(
                config.registry.base_url.clone(),
                config.registry.timeout(),
            )?)
        }
    };
    Ok(registry)
}

pub fn create_run_params_store(
    config: &AppConfig,
    store: Arc<dyn ArtifactStore>,
) -> Arc<dyn RunParamsStore> {
    Arc::new(FsRunParamsStore::new(store, config.artifacts.run_config_dir.clone()))
}

/// Create the application state for `serve`
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_artifact_store(config);
    let registry = create_model_registry(config, store.clone())?;
    let run_params = create_run_params_store(config, store.clone());

    let prediction_service = PredictionService::new(
        store,
        registry,
        run_params,
        config.artifacts.preprocessor.clone(),
    );

    let request_store = SqliteRequestStore::connect(&config.database).await?;
    request_store.migrate().await?;
    info!(url = %config.database.url, "Request log connected");

    Ok(AppState::new(
        Arc::new(prediction_service),
        Arc::new(request_store),
    ))
}

pub fn create_training_orchestrator(config: &AppConfig) -> Result<TrainingOrchestrator, DomainError> {
    let store = create_artifact_store(config);

    let deps = TrainingDeps {
        source: Arc::new(CsvDatasetSource::new(config.ingestion.timeout())?),
        datasets: Arc::new(CsvDatasetStore::new(store.clone(), &config.artifacts)),
        registry: create_model_registry(config, store.clone())?,
        run_params: create_run_params_store(config, store.clone()),
        store,
    };

    Ok(TrainingOrchestrator::new(
        deps,
        TrainingSettings::from_config(config),
    ))
}

pub async fn create_drift_service(config: &AppConfig) -> Result<DriftService, DomainError> {
    let store = create_artifact_store(config);
    let datasets = Arc::new(CsvDatasetStore::new(store.clone(), &config.artifacts));
    let requests = Arc::new(SqliteRequestStore::connect(&config.database).await?);
    let detector = DriftDetector::new(store, config.artifacts.reports_dir.clone())
        .with_thresholds(config.drift.clone());

    Ok(DriftService::new(datasets, requests, detector))
}
