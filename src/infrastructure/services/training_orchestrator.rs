//! Training orchestrator - ingestion through persisted artifacts
//!
//! Each stage consumes the value produced by the previous one, so a run can
//! only advance `Ingested -> FeatureEngineered -> TransformFitted ->
//! ModelSearched -> Persisted` in order.

use std::sync::Arc;

use ndarray::{Array1, Array2};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::dataset::{train_test_split, DatasetSource, DatasetStore, SplitSide, TrainTestSplit};
use crate::domain::features::{derive_all, drop_zero_listening_time};
use crate::domain::frame::FeatureFrame;
use crate::domain::model::{
    default_param_grid, BayesianRidgeFamily, EstimatorFamily, ParamGrid, ParamSet, Regressor,
};
use crate::domain::record::{LabeledRecord, RawRecord};
use crate::domain::registry::{ModelRegistry, RegisteredModel, RunParameters, RunParamsStore};
use crate::domain::search::{search, HalvingIteration, SearchConfig, SearchContext, SearchOutcome};
use crate::domain::storage::ArtifactStore;
use crate::domain::transform::{FittedTransform, TreeEncoderConfig};
use crate::domain::DomainError;

/// Knobs for one training run
#[derive(Debug, Clone)]
pub struct TrainingSettings {
    pub test_size: f64,
    pub split_seed: u64,
    pub drop_zero_listening_time: bool,
    pub folds: usize,
    pub search: SearchConfig,
    pub encoder: TreeEncoderConfig,
    pub model_name: String,
    pub register: bool,
    pub transform_path: String,
}

impl TrainingSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            test_size: config.ingestion.test_size,
            split_seed: config.ingestion.seed,
            drop_zero_listening_time: config.ingestion.drop_zero_listening_time,
            folds: config.training.folds,
            search: SearchConfig {
                factor: config.training.factor,
                seed: config.training.seed,
            },
            encoder: TreeEncoderConfig::default(),
            model_name: config.training.model_name.clone(),
            register: config.training.register,
            transform_path: config.artifacts.preprocessor.clone(),
        }
    }
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Collaborators for [`TrainingOrchestrator`]
#[derive(Clone)]
pub struct TrainingDeps {
    pub source: Arc<dyn DatasetSource>,
    pub datasets: Arc<dyn DatasetStore>,
    pub store: Arc<dyn ArtifactStore>,
    pub registry: Arc<dyn ModelRegistry>,
    pub run_params: Arc<dyn RunParamsStore>,
}

/// Split persisted, nothing derived yet
#[derive(Debug)]
pub struct Ingested {
    run_id: String,
    split: TrainTestSplit,
}

impl Ingested {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }
}

#[derive(Debug)]
struct SideFrame {
    frame: FeatureFrame,
    target: Vec<f64>,
}

impl SideFrame {
    fn from_records(records: &[LabeledRecord]) -> Self {
        let raw: Vec<RawRecord> = records.iter().map(|r| r.record.clone()).collect();
        Self {
            frame: FeatureFrame::from_engineered(&derive_all(&raw)),
            target: records.iter().map(|r| r.listening_time_minutes).collect(),
        }
    }
}

/// Engineered frames and targets for both sides
#[derive(Debug)]
pub struct FeatureEngineered {
    run_id: String,
    train: SideFrame,
    test: SideFrame,
}

impl FeatureEngineered {
    pub fn train_frame(&self) -> &FeatureFrame {
        &self.train.frame
    }

    pub fn test_frame(&self) -> &FeatureFrame {
        &self.test.frame
    }
}

/// Fitted transform and dense matrices, feature store written
#[derive(Debug)]
pub struct TransformFitted {
    run_id: String,
    transform: FittedTransform,
    x_train: Array2<f64>,
    y_train: Vec<f64>,
    x_test: Array2<f64>,
    y_test: Vec<f64>,
}

impl TransformFitted {
    pub fn transform(&self) -> &FittedTransform {
        &self.transform
    }

    pub fn train_shape(&self) -> (usize, usize) {
        self.x_train.dim()
    }
}

/// Best candidate found and scored on the held-out side
#[derive(Debug)]
pub struct ModelSearched {
    run_id: String,
    transform: FittedTransform,
    outcome: SearchOutcome,
    test_rmse: f64,
}

impl ModelSearched {
    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    pub fn test_rmse(&self) -> f64 {
        self.test_rmse
    }
}

/// What a completed run left behind
#[derive(Debug, Clone)]
pub struct Persisted {
    pub run_id: String,
    pub best_params: ParamSet,
    pub best_score: f64,
    pub test_rmse: f64,
    pub iterations: Vec<HalvingIteration>,
    pub registered: Option<RegisteredModel>,
    pub pointer_file: Option<String>,
}

/// Runs the training pipeline stage by stage
pub struct TrainingOrchestrator {
    deps: TrainingDeps,
    family: Arc<dyn EstimatorFamily>,
    grid: ParamGrid,
    settings: TrainingSettings,
}

impl TrainingOrchestrator {
    pub fn new(deps: TrainingDeps, settings: TrainingSettings) -> Self {
        Self {
            deps,
            family: Arc::new(BayesianRidgeFamily),
            grid: default_param_grid(),
            settings,
        }
    }

    /// Search a different estimator or grid
    pub fn with_estimator(mut self, family: Arc<dyn EstimatorFamily>, grid: ParamGrid) -> Self {
        self.family = family;
        self.grid = grid;
        self
    }

    pub fn settings(&self) -> &TrainingSettings {
        &self.settings
    }

    pub async fn ingest(&self, uri: &str) -> Result<Ingested, DomainError> {
        let mut records = self.deps.source.fetch(uri).await?;
        let fetched = records.len();

        if self.settings.drop_zero_listening_time {
            records = drop_zero_listening_time(records);
        }

        let split = train_test_split(records, self.settings.test_size, self.settings.split_seed)?;
        self.deps.datasets.save_split(&split).await?;

        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            stage = "ingest",
            fetched,
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            "Stage completed"
        );

        Ok(Ingested { run_id, split })
    }

    pub fn engineer_features(&self, ingested: Ingested) -> FeatureEngineered {
        let Ingested { run_id, split } = ingested;
        let train = SideFrame::from_records(&split.train);
        let test = SideFrame::from_records(&split.test);

        info!(run_id = %run_id, stage = "engineer_features", columns = ?train.frame.column_names(), "Stage completed");
        FeatureEngineered { run_id, train, test }
    }

    pub async fn fit_transform(
        &self,
        engineered: FeatureEngineered,
    ) -> Result<TransformFitted, DomainError> {
        let FeatureEngineered { run_id, train, test } = engineered;

        let transform = FittedTransform::fit_with(&train.frame, &train.target, &self.settings.encoder)?;
        let x_train = transform.transform(&train.frame)?;
        let x_test = transform.transform(&test.frame)?;

        let names = transform.feature_names_out();
        self.deps
            .datasets
            .save_features(SplitSide::Train, &names, &x_train, &train.target)
            .await?;
        self.deps
            .datasets
            .save_features(SplitSide::Test, &names, &x_test, &test.target)
            .await?;

        info!(run_id = %run_id, stage = "fit_transform", features = names.len(), "Stage completed");
        Ok(TransformFitted {
            run_id,
            transform,
            x_train,
            y_train: train.target,
            x_test,
            y_test: test.target,
        })
    }

    /// Runs the search on a blocking thread and scores the winner on the test side
    pub async fn search_model(
        &self,
        fitted: TransformFitted,
        ctx: &SearchContext,
    ) -> Result<ModelSearched, DomainError> {
        let TransformFitted {
            run_id,
            transform,
            x_train,
            y_train,
            x_test,
            y_test,
        } = fitted;

        let family = self.family.clone();
        let grid = self.grid.clone();
        let folds = self.settings.folds;
        let config = self.settings.search;
        let ctx = ctx.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            search(family.as_ref(), &grid, &x_train, &y_train, folds, &config, &ctx)
        })
        .await
        .map_err(|e| DomainError::internal(format!("Search task failed: {}", e)))??;

        let test_rmse = rmse(&outcome.best_model.predict(x_test.view())?, &y_test);

        info!(
            run_id = %run_id,
            stage = "search_model",
            params = %outcome.best_params,
            cv_score = outcome.best_score,
            test_rmse,
            "Stage completed"
        );

        Ok(ModelSearched {
            run_id,
            transform,
            outcome,
            test_rmse,
        })
    }

    /// Transform first, then the registry version, the run pointer last
    ///
    /// The transform carries the run id, so inference refuses to pair it with
    /// a model from another run when a later step fails.
    pub async fn persist(&self, searched: ModelSearched) -> Result<Persisted, DomainError> {
        let ModelSearched {
            run_id,
            transform,
            outcome,
            test_rmse,
        } = searched;
        let transform = transform.with_run_id(run_id.clone());

        self.deps
            .store
            .write(&self.settings.transform_path, &transform.to_bytes()?)
            .await?;

        let (registered, pointer_file) = if self.settings.register {
            let registered = self
                .deps
                .registry
                .register(&self.settings.model_name, &run_id, &outcome.best_model)
                .await?;
            let file = self
                .deps
                .run_params
                .write(&RunParameters::new(&registered))
                .await?;
            (Some(registered), Some(file))
        } else {
            (None, None)
        };

        info!(
            run_id = %run_id,
            stage = "persist",
            transform = %self.settings.transform_path,
            pointer = pointer_file.as_deref().unwrap_or("-"),
            "Stage completed"
        );

        Ok(Persisted {
            run_id,
            best_params: outcome.best_params,
            best_score: outcome.best_score,
            test_rmse,
            iterations: outcome.iterations,
            registered,
            pointer_file,
        })
    }

    /// All stages in order; the first failure aborts the run
    pub async fn run(&self, uri: &str, ctx: &SearchContext) -> Result<Persisted, DomainError> {
        let ingested = self.ingest(uri).await.map_err(|e| stage_failed("ingest", e))?;
        let engineered = self.engineer_features(ingested);
        let fitted = self
            .fit_transform(engineered)
            .await
            .map_err(|e| stage_failed("fit_transform", e))?;
        let searched = self
            .search_model(fitted, ctx)
            .await
            .map_err(|e| stage_failed("search_model", e))?;
        self.persist(searched)
            .await
            .map_err(|e| stage_failed("persist", e))
    }
}

fn stage_failed(stage: &str, err: DomainError) -> DomainError {
    error!(stage = %stage, error = %err, "Training stage failed");
    err.with_context(stage)
}

fn rmse(predicted: &Array1<f64>, actual: &[f64]) -> f64 {
    let sse: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sse / actual.len().max(1) as f64).sqrt()
}
