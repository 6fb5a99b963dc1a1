//! Model registry on an artifact store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::model::TrainedModel;
use crate::domain::registry::{validate_model_name, ModelRegistry, ModelUri, RegisteredModel};
use crate::domain::storage::{ArtifactStore, ArtifactStoreExt};
use crate::domain::DomainError;

const MODEL_FILE: &str = "model.json";
const INDEX_FILE: &str = "versions.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionIndex {
    versions: Vec<RegisteredModel>,
}

impl VersionIndex {
    fn latest(&self) -> Option<u32> {
        self.versions.iter().map(|m| m.uri.version()).max()
    }
}

/// `<root>/<name>/<version>/model.json` plus a per-name version index
#[derive(Debug, Clone)]
pub struct FsModelRegistry {
    store: Arc<dyn ArtifactStore>,
    root: String,
}

impl FsModelRegistry {
    pub fn new(store: Arc<dyn ArtifactStore>, root: impl Into<String>) -> Self {
        Self {
            store,
            root: root.into().trim_end_matches('/').to_string(),
        }
    }

    fn index_path(&self, name: &str) -> String {
        format!("{}/{}/{}", self.root, name, INDEX_FILE)
    }

    fn model_path(&self, uri: &ModelUri) -> String {
        format!("{}/{}/{}/{}", self.root, uri.name(), uri.version(), MODEL_FILE)
    }

    async fn index(&self, name: &str) -> Result<VersionIndex, DomainError> {
        Ok(self
            .store
            .read_json(&self.index_path(name))
            .await?
            .unwrap_or_default())
    }
}

fn registry_error(e: DomainError) -> DomainError {
    DomainError::registry(e.message().to_string())
}

#[async_trait]
impl ModelRegistry for FsModelRegistry {
    async fn register(
        &self,
        name: &str,
        run_id: &str,
        model: &TrainedModel,
    ) -> Result<RegisteredModel, DomainError> {
        validate_model_name(name)?;
        let bytes = model.to_bytes()?;

        let mut index = self.index(name).await.map_err(registry_error)?;
        let mut version = index.latest().unwrap_or(0) + 1;

        // a version directory is claimed by the first writer of its model file
        let uri = loop {
            let uri = ModelUri::new(name, version)?;
            if self
                .store
                .create_new(&self.model_path(&uri), &bytes)
                .await
                .map_err(registry_error)?
            {
                break uri;
            }
            version += 1;
        };

        let registered = RegisteredModel {
            uri,
            run_id: run_id.to_string(),
            estimator: model.estimator().to_string(),
            created_at: Utc::now(),
        };
        index.versions.push(registered.clone());
        self.store
            .write_json(&self.index_path(name), &index)
            .await
            .map_err(registry_error)?;

        info!(uri = %registered.uri, run_id = %run_id, "Registered model");
        Ok(registered)
    }

    async fn load(&self, uri: &ModelUri) -> Result<TrainedModel, DomainError> {
        let bytes = self
            .store
            .read(&self.model_path(uri))
            .await
            .map_err(registry_error)?
            .ok_or_else(|| DomainError::registry(format!("Model '{}' not found", uri)))?;

        TrainedModel::from_bytes(&bytes)
    }

    async fn latest_version(&self, name: &str) -> Result<Option<u32>, DomainError> {
        validate_model_name(name)?;
        Ok(self.index(name).await.map_err(registry_error)?.latest())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::trained_model;
    use super::*;
    use crate::domain::storage::mock::MockArtifactStore;
    use crate::domain::ErrorKind;

    fn registry(store: Arc<MockArtifactStore>) -> FsModelRegistry {
        FsModelRegistry::new(store, "registry")
    }

    #[tokio::test]
    async fn test_versions_increase() {
        let store = Arc::new(MockArtifactStore::new());
        let registry = registry(store.clone());
        let model = trained_model();

        assert_eq!(registry.latest_version("podcast").await.unwrap(), None);

        let first = registry.register("podcast", "run-1", &model).await.unwrap();
        let second = registry.register("podcast", "run-2", &model).await.unwrap();

        assert_eq!(first.uri.to_string(), "models:/podcast/1");
        assert_eq!(second.uri.version(), 2);
        assert_eq!(second.estimator, "bayesian_ridge");
        assert_eq!(registry.latest_version("podcast").await.unwrap(), Some(2));
        assert!(store.paths().contains(&"registry/podcast/2/model.json".to_string()));
    }

    #[tokio::test]
    async fn test_load_round_trip() {
        let registry = registry(Arc::new(MockArtifactStore::new()));
        let model = trained_model();
        let registered = registry.register("podcast", "run", &model).await.unwrap();

        let loaded = registry.load(&registered.uri).await.unwrap();
        assert_eq!(loaded, model);
    }

    #[tokio::test]
    async fn test_failures_are_registry_errors() {
        let registry = registry(Arc::new(MockArtifactStore::new()));
        let missing = registry
            .load(&ModelUri::new("podcast", 9).unwrap())
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Registry);

        let corrupt = FsModelRegistry::new(
            Arc::new(MockArtifactStore::new().with_file("registry/podcast/1/model.json", "{")),
            "registry",
        );
        let err = corrupt
            .load(&ModelUri::new("podcast", 1).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);

        let broken = registry_with_error();
        let err = broken
            .register("podcast", "run", &trained_model())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[tokio::test]
    async fn test_existing_version_directory_is_skipped() {
        let store = Arc::new(MockArtifactStore::new().with_file("registry/podcast/1/model.json", "{}"));
        let registry = registry(store);

        let registered = registry
            .register("podcast", "run", &trained_model())
            .await
            .unwrap();
        assert_eq!(registered.uri.version(), 2);
    }

    fn registry_with_error() -> FsModelRegistry {
        FsModelRegistry::new(Arc::new(MockArtifactStore::new().with_error("disk")), "registry")
    }
}
