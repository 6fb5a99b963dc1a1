//! Artifact store trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Blob storage addressed by `/`-separated relative paths
///
/// Writes must be atomic: a reader sees either the previous content or the
/// new content, never a partial file.
#[async_trait]
pub trait ArtifactStore: Send + Sync + Debug {
    /// Reads an artifact, `None` if it does not exist
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Writes an artifact, replacing any previous content
    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Writes an artifact only if the path is free; returns false if taken
    async fn create_new(&self, path: &str, bytes: &[u8]) -> Result<bool, DomainError>;

    /// File names directly under a directory, sorted; empty if absent
    async fn list(&self, dir: &str) -> Result<Vec<String>, DomainError>;

    async fn exists(&self, path: &str) -> Result<bool, DomainError> {
        Ok(self.read(path).await?.is_some())
    }
}

/// Typed JSON helpers over [`ArtifactStore`]
pub trait ArtifactStoreExt: ArtifactStore {
    fn read_json<'a, V>(
        &'a self,
        path: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.read(path).await? {
                Some(data) => {
                    let value: V = serde_json::from_slice(&data).map_err(|e| {
                        DomainError::storage(format!("Failed to deserialize '{}': {}", path, e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    fn write_json<'a, V>(
        &'a self,
        path: &'a str,
        value: &'a V,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_vec_pretty(value).map_err(|e| {
                DomainError::storage(format!("Failed to serialize '{}': {}", path, e))
            })?;
            self.write(path, &data).await
        }
    }
}

impl<T: ArtifactStore + ?Sized> ArtifactStoreExt for T {}
