//! Registry traits

use async_trait::async_trait;

use super::{ModelUri, RegisteredModel, RunParameters};
use crate::domain::model::TrainedModel;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Versioned model storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// Stores a new version of `name` and returns its record
    async fn register(
        &self,
        name: &str,
        run_id: &str,
        model: &TrainedModel,
    ) -> Result<RegisteredModel, DomainError>;

    /// Loads a model; any failure surfaces as `Registry`
    async fn load(&self, uri: &ModelUri) -> Result<TrainedModel, DomainError>;

    /// Highest registered version of `name`
    async fn latest_version(&self, name: &str) -> Result<Option<u32>, DomainError>;
}

/// Series of run pointer files
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RunParamsStore: Send + Sync {
    /// Writes a pointer and returns its file name
    async fn write(&self, params: &RunParameters) -> Result<String, DomainError>;

    /// The pointer with the newest embedded timestamp
    async fn latest(&self) -> Result<Option<RunParameters>, DomainError>;
}
