//! Dataset source and store traits

use async_trait::async_trait;
use ndarray::Array2;

use super::TrainTestSplit;
use crate::domain::record::LabeledRecord;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Which side of the split a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Train,
    Test,
}

impl SplitSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

/// Raw labelled data for a training run
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetches and parses the dataset at `uri`
    async fn fetch(&self, uri: &str) -> Result<Vec<LabeledRecord>, DomainError>;
}

/// Persisted split files and feature store tables
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn save_split(&self, split: &TrainTestSplit) -> Result<(), DomainError>;

    /// Reads one side of the split; `ArtifactMissing` if it was never written
    async fn load_split(&self, side: SplitSide) -> Result<Vec<LabeledRecord>, DomainError>;

    /// Writes transformed features plus the target column
    async fn save_features(
        &self,
        side: SplitSide,
        feature_names: &[String],
        features: &Array2<f64>,
        target: &[f64],
    ) -> Result<(), DomainError>;
}
