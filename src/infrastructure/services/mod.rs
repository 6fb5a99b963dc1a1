//! Infrastructure services

mod drift_service;
mod prediction_service;
mod training_orchestrator;

#[cfg(test)]
mod fixtures;

pub use drift_service::DriftService;
pub use prediction_service::{PredictionService, Readiness};
pub use training_orchestrator::{
    FeatureEngineered, Ingested, ModelSearched, Persisted, TrainingDeps, TrainingOrchestrator,
    TrainingSettings, TransformFitted,
};
