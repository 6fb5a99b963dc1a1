//! Prediction service - single-record inference against the latest run

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::features::derive;
use crate::domain::frame::FeatureFrame;
use crate::domain::model::{Regressor, TrainedModel};
use crate::domain::record::RawRecord;
use crate::domain::registry::{ModelRegistry, ModelUri, RunParameters, RunParamsStore};
use crate::domain::storage::ArtifactStore;
use crate::domain::transform::FittedTransform;
use crate::domain::{DomainError, ErrorKind};

#[derive(Debug)]
struct CachedModel {
    uri: ModelUri,
    model: Arc<TrainedModel>,
}

/// Loads the persisted transform and the pointed-to model, then predicts
pub struct PredictionService {
    store: Arc<dyn ArtifactStore>,
    registry: Arc<dyn ModelRegistry>,
    run_params: Arc<dyn RunParamsStore>,
    transform_path: String,
    cache: RwLock<Option<CachedModel>>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("transform_path", &self.transform_path)
            .finish_non_exhaustive()
    }
}

impl PredictionService {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        registry: Arc<dyn ModelRegistry>,
        run_params: Arc<dyn RunParamsStore>,
        transform_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            run_params,
            transform_path: transform_path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Predicted listening time in minutes
    pub async fn predict(&self, record: &RawRecord) -> Result<f64, DomainError> {
        self.predict_inner(record)
            .await
            .map_err(|e| e.with_context("predict"))
    }

    async fn predict_inner(&self, record: &RawRecord) -> Result<f64, DomainError> {
        let frame = FeatureFrame::from_engineered(&[derive(record)]);
        let transform = self.load_transform().await?;
        let pointer = self.current_pointer().await?;
        ensure_same_run(&transform, &pointer)?;
        let model = self.load_model(&pointer.model_uri).await?;

        let x = transform.transform(&frame)?;
        if model.n_features() != x.ncols() {
            return Err(DomainError::schema(format!(
                "Model expects {} features, transform produces {}",
                model.n_features(),
                x.ncols()
            )));
        }

        let value = model
            .predict(x.view())?
            .first()
            .copied()
            .ok_or_else(|| DomainError::internal("Model returned no prediction"))?;

        if !value.is_finite() {
            return Err(DomainError::internal(format!(
                "Model produced a non-finite prediction ({})",
                value
            )));
        }

        debug!(prediction = value, "Predicted listening time");
        Ok(value)
    }

    /// Reads the transform on every call so a retrain is picked up at once
    pub async fn load_transform(&self) -> Result<FittedTransform, DomainError> {
        let bytes = self.store.read(&self.transform_path).await?.ok_or_else(|| {
            DomainError::artifact_missing(format!(
                "Preprocessor '{}' not found; run training first",
                self.transform_path
            ))
        })?;

        FittedTransform::from_bytes(&bytes)
    }

    async fn current_pointer(&self) -> Result<RunParameters, DomainError> {
        self.run_params
            .latest()
            .await?
            .ok_or_else(|| DomainError::artifact_missing("No run parameters found; run training first"))
    }

    /// URI named by the newest run pointer
    pub async fn current_uri(&self) -> Result<ModelUri, DomainError> {
        self.current_pointer().await.map(|params| params.model_uri)
    }

    async fn load_model(&self, uri: &ModelUri) -> Result<Arc<TrainedModel>, DomainError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| &c.uri == uri) {
                return Ok(cached.model.clone());
            }
        }

        let model = self.registry.load(uri).await.map_err(|e| match e.kind() {
            ErrorKind::Registry => e,
            _ => DomainError::registry(e.message().to_string()),
        })?;
        let model = Arc::new(model);

        let mut cache = self.cache.write().await;
        *cache = Some(CachedModel {
            uri: uri.clone(),
            model: model.clone(),
        });

        info!(uri = %uri, "Loaded model into cache");
        Ok(model)
    }

    /// Per-artifact state for the readiness probe; loads nothing
    pub async fn readiness(&self) -> Readiness {
        let preprocessor = match self.store.exists(&self.transform_path).await {
            Ok(true) => Ok(self.transform_path.clone()),
            Ok(false) => Err(format!("Preprocessor '{}' not found", self.transform_path)),
            Err(e) => Err(e.message().to_string()),
        };
        let model = self.current_uri().await.map_err(|e| e.message().to_string());

        Readiness { preprocessor, model }
    }

    /// True once both a transform and a run pointer exist
    pub async fn is_ready(&self) -> bool {
        self.readiness().await.is_ready()
    }
}

/// The transform and the pointed-to model must come from the same training run
fn ensure_same_run(transform: &FittedTransform, pointer: &RunParameters) -> Result<(), DomainError> {
    match transform.run_id() {
        Some(run_id) if run_id == pointer.run_id => Ok(()),
        found => Err(DomainError::artifact_mismatch(format!(
            "Preprocessor was fit by run '{}' but the pointer names run '{}' ({}); retrain",
            found.unwrap_or("unknown"),
            pointer.run_id,
            pointer.model_uri
        ))),
    }
}

/// What inference would find right now; `Err` holds the reason
#[derive(Debug, Clone, PartialEq)]
pub struct Readiness {
    pub preprocessor: Result<String, String>,
    pub model: Result<ModelUri, String>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.preprocessor.is_ok() && self.model.is_ok()
    }
}
