//! Split files and feature store tables on an artifact store

use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array2;
use tracing::info;

use super::row::{csv_error, parse_labeled, write_labeled};
use crate::config::ArtifactsConfig;
use crate::domain::dataset::{DatasetStore, SplitSide, TrainTestSplit};
use crate::domain::frame::LISTENING_TIME;
use crate::domain::record::LabeledRecord;
use crate::domain::storage::ArtifactStore;
use crate::domain::DomainError;

/// CSV persistence for the train/test split and the transformed features
#[derive(Debug, Clone)]
pub struct CsvDatasetStore {
    store: Arc<dyn ArtifactStore>,
    train_path: String,
    test_path: String,
    feature_store_dir: String,
}

impl CsvDatasetStore {
    pub fn new(store: Arc<dyn ArtifactStore>, layout: &ArtifactsConfig) -> Self {
        Self {
            store,
            train_path: layout.train_data.clone(),
            test_path: layout.test_data.clone(),
            feature_store_dir: layout.feature_store_dir.clone(),
        }
    }

    pub fn split_path(&self, side: SplitSide) -> &str {
        match side {
            SplitSide::Train => &self.train_path,
            SplitSide::Test => &self.test_path,
        }
    }

    pub fn features_path(&self, side: SplitSide) -> String {
        format!(
            "{}/xform_{}_data.csv",
            self.feature_store_dir.trim_end_matches('/'),
            side.as_str()
        )
    }
}

#[async_trait]
impl DatasetStore for CsvDatasetStore {
    async fn save_split(&self, split: &TrainTestSplit) -> Result<(), DomainError> {
        for (side, records) in [(SplitSide::Train, &split.train), (SplitSide::Test, &split.test)] {
            let bytes = write_labeled(records)?;
            self.store.write(self.split_path(side), &bytes).await?;
        }

        info!(
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            "Saved train/test split"
        );
        Ok(())
    }

    async fn load_split(&self, side: SplitSide) -> Result<Vec<LabeledRecord>, DomainError> {
        let path = self.split_path(side);
        let bytes = self.store.read(path).await?.ok_or_else(|| {
            DomainError::artifact_missing(format!("{} split '{}' not found", side.as_str(), path))
        })?;

        parse_labeled(&bytes)
    }

    async fn save_features(
        &self,
        side: SplitSide,
        feature_names: &[String],
        features: &Array2<f64>,
        target: &[f64],
    ) -> Result<(), DomainError> {
        if features.ncols() != feature_names.len() || features.nrows() != target.len() {
            return Err(DomainError::schema(format!(
                "Feature matrix is {}x{}, expected {}x{}",
                features.nrows(),
                features.ncols(),
                target.len(),
                feature_names.len()
            )));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(
                feature_names
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(LISTENING_TIME)),
            )
            .map_err(csv_error)?;

        for (row, y) in features.rows().into_iter().zip(target) {
            writer
                .write_record(row.iter().chain(std::iter::once(y)).map(f64::to_string))
                .map_err(csv_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DomainError::internal(format!("Failed to flush CSV: {}", e)))?;

        let path = self.features_path(side);
        self.store.write(&path, &bytes).await?;
        info!(path = %path, rows = target.len(), "Saved feature store table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RawRecord;
    use crate::domain::storage::mock::MockArtifactStore;
    use crate::domain::ErrorKind;
    use ndarray::array;

    fn labeled(name: &str, minutes: f64) -> LabeledRecord {
        let record = RawRecord::builder()
            .podcast_name(name)
            .episode_length_minutes(50.0)
            .genre("Health")
            .publication_day("Tuesday")
            .publication_time("Evening")
            .build()
            .unwrap();
        LabeledRecord::new(record, minutes).unwrap()
    }

    fn dataset_store(store: Arc<MockArtifactStore>) -> CsvDatasetStore {
        CsvDatasetStore::new(store, &ArtifactsConfig::default())
    }

    #[tokio::test]
    async fn test_split_round_trip() {
        let store = Arc::new(MockArtifactStore::new());
        let datasets = dataset_store(store.clone());
        let split = TrainTestSplit {
            train: vec![labeled("A", 10.0), labeled("B", 20.0)],
            test: vec![labeled("C", 30.0)],
        };

        datasets.save_split(&split).await.unwrap();

        assert_eq!(store.paths(), vec!["test_data.csv", "train_data.csv"]);
        assert_eq!(datasets.load_split(SplitSide::Train).await.unwrap(), split.train);
        assert_eq!(datasets.load_split(SplitSide::Test).await.unwrap(), split.test);
    }

    #[tokio::test]
    async fn test_missing_split() {
        let datasets = dataset_store(Arc::new(MockArtifactStore::new()));
        let err = datasets.load_split(SplitSide::Train).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
    }

    #[tokio::test]
    async fn test_feature_table_layout() {
        let store = Arc::new(MockArtifactStore::new());
        let datasets = dataset_store(store.clone());
        let names = vec!["num__x".to_string(), "cat__y".to_string()];

        datasets
            .save_features(SplitSide::Test, &names, &array![[0.5, -1.0], [1.5, 2.0]], &[3.0, 4.0])
            .await
            .unwrap();

        let bytes = store
            .read("feature_store/xform_test_data.csv")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "num__x,cat__y,Listening_Time_minutes\n0.5,-1,3\n1.5,2,4\n"
        );
    }

    #[tokio::test]
    async fn test_feature_shape_mismatch() {
        let datasets = dataset_store(Arc::new(MockArtifactStore::new()));
        let err = datasets
            .save_features(SplitSide::Train, &["a".to_string()], &array![[1.0, 2.0]], &[1.0])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
