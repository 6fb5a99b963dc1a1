//! Application state for shared services

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::record::RawRecord;
use crate::domain::request_log::RequestStore;
use crate::domain::DomainError;
use crate::infrastructure::services::{PredictionService, Readiness};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub prediction_service: Arc<dyn PredictionServiceTrait>,
    pub request_store: Arc<dyn RequestStore>,
}

impl AppState {
    pub fn new(
        prediction_service: Arc<dyn PredictionServiceTrait>,
        request_store: Arc<dyn RequestStore>,
    ) -> Self {
        Self {
            prediction_service,
            request_store,
        }
    }
}

/// Trait for prediction service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PredictionServiceTrait: Send + Sync {
    async fn predict(&self, record: &RawRecord) -> Result<f64, DomainError>;

    async fn readiness(&self) -> Readiness;
}

#[async_trait]
impl PredictionServiceTrait for PredictionService {
    async fn predict(&self, record: &RawRecord) -> Result<f64, DomainError> {
        PredictionService::predict(self, record).await
    }

    async fn readiness(&self) -> Readiness {
        PredictionService::readiness(self).await
    }
}
