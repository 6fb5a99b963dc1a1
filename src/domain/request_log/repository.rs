//! Request store trait

use async_trait::async_trait;

use super::{LiveObservation, PredictionEntry, SubmittedRequest};
use crate::domain::record::RawRecord;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Log of served requests and their predictions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Stores a request and its prediction atomically
    async fn record_prediction(
        &self,
        record: &RawRecord,
        prediction: f64,
    ) -> Result<(SubmittedRequest, PredictionEntry), DomainError>;

    async fn list_requests(&self) -> Result<Vec<SubmittedRequest>, DomainError>;

    async fn list_predictions(&self) -> Result<Vec<PredictionEntry>, DomainError>;

    /// Requests joined with predictions on `id = data_id`, ordered by prediction id
    async fn live_observations(&self) -> Result<Vec<LiveObservation>, DomainError>;
}
