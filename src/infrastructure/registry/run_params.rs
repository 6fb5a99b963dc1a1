//! Run pointer files

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::registry::{RunParameters, RunParamsStore};
use crate::domain::storage::{ArtifactStore, ArtifactStoreExt};
use crate::domain::DomainError;

/// Timestamped JSON pointers in one directory
#[derive(Debug, Clone)]
pub struct FsRunParamsStore {
    store: Arc<dyn ArtifactStore>,
    dir: String,
}

impl FsRunParamsStore {
    pub fn new(store: Arc<dyn ArtifactStore>, dir: impl Into<String>) -> Self {
        Self {
            store,
            dir: dir.into().trim_end_matches('/').to_string(),
        }
    }

    fn path(&self, file_name: &str) -> String {
        format!("{}/{}", self.dir, file_name)
    }
}

#[async_trait]
impl RunParamsStore for FsRunParamsStore {
    async fn write(&self, params: &RunParameters) -> Result<String, DomainError> {
        let file_name = params.file_name();
        self.store.write_json(&self.path(&file_name), params).await?;

        debug!(file = %file_name, uri = %params.model_uri, "Wrote run pointer");
        Ok(file_name)
    }

    async fn latest(&self) -> Result<Option<RunParameters>, DomainError> {
        let names = self.store.list(&self.dir).await?;

        let newest = names
            .iter()
            .filter_map(|name| match RunParameters::parse_file_timestamp(name) {
                Some(ts) => Some((ts, name)),
                None => {
                    warn!(file = %name, dir = %self.dir, "Skipping unrecognised run pointer file");
                    None
                }
            })
            .max();

        let Some((_, name)) = newest else {
            return Ok(None);
        };

        let path = self.path(name);
        self.store
            .read_json::<RunParameters>(&path)
            .await?
            .map(Some)
            .ok_or_else(|| DomainError::storage(format!("Run pointer '{}' vanished", path)))
    }
}
