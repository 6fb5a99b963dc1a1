//! Filesystem artifact store

use std::io::ErrorKind as IoErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::domain::storage::ArtifactStore;
use crate::domain::DomainError;

const TEMP_SUFFIX: &str = ".tmp";

/// Artifacts as files under a root directory
///
/// Every write goes to a temp file in the target's directory, is synced and
/// then renamed over the target.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a relative artifact path
    pub fn resolve(&self, path: &str) -> Result<PathBuf, DomainError> {
        let relative = Path::new(path);

        if path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(DomainError::validation(format!(
                "Invalid artifact path '{}'",
                path
            )));
        }

        Ok(self.root.join(relative))
    }

    fn temp_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.{}{}", name, Uuid::new_v4(), TEMP_SUFFIX))
    }

    async fn write_temp(&self, target: &Path, bytes: &[u8]) -> Result<PathBuf, DomainError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }

        let temp = Self::temp_path(target);
        let result = async {
            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp).await;
            return Err(DomainError::storage(format!(
                "Failed to write '{}': {}",
                target.display(),
                e
            )));
        }

        Ok(temp)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let full = self.resolve(path)?;

        match fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to read '{}': {}",
                full.display(),
                e
            ))),
        }
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let full = self.resolve(path)?;
        let temp = self.write_temp(&full, bytes).await?;

        if let Err(e) = fs::rename(&temp, &full).await {
            let _ = fs::remove_file(&temp).await;
            return Err(DomainError::storage(format!(
                "Failed to move '{}' into place: {}",
                full.display(),
                e
            )));
        }

        debug!(path = %full.display(), bytes = bytes.len(), "Wrote artifact");
        Ok(())
    }

    async fn create_new(&self, path: &str, bytes: &[u8]) -> Result<bool, DomainError> {
        let full = self.resolve(path)?;
        let temp = self.write_temp(&full, bytes).await?;

        // hard_link refuses to replace an existing target
        let linked = fs::hard_link(&temp, &full).await;
        let _ = fs::remove_file(&temp).await;

        match linked {
            Ok(()) => {
                debug!(path = %full.display(), "Created artifact");
                Ok(true)
            }
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to create '{}': {}",
                full.display(),
                e
            ))),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, DomainError> {
        let full = self.resolve(dir)?;

        let mut entries = match fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to list '{}': {}",
                    full.display(),
                    e
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list '{}': {}", full.display(), e)))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();

            if is_file && !name.starts_with('.') && !name.ends_with(TEMP_SUFFIX) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store.write("nested/a.json", b"{}").await.unwrap();
        assert_eq!(store.read("nested/a.json").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.read("nested/missing.json").await.unwrap(), None);

        store.write("nested/a.json", b"[1]").await.unwrap();
        assert_eq!(store.read("nested/a.json").await.unwrap(), Some(b"[1]".to_vec()));
    }

    #[tokio::test]
    async fn test_writes_leave_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store.write("out/x.csv", b"a,b\n").await.unwrap();
        store.create_new("out/y.json", b"{}").await.unwrap();
        store.create_new("out/y.json", b"{}").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.ends_with(TEMP_SUFFIX)));
    }

    #[tokio::test]
    async fn test_create_new_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        assert!(store.create_new("r/report.json", b"first").await.unwrap());
        assert!(!store.create_new("r/report.json", b"second").await.unwrap());
        assert_eq!(
            store.read("r/report.json").await.unwrap(),
            Some(b"first".to_vec())
        );
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_skips_dirs() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        store.write("d/b.json", b"").await.unwrap();
        store.write("d/a.json", b"").await.unwrap();
        store.write("d/sub/c.json", b"").await.unwrap();

        assert_eq!(store.list("d").await.unwrap(), vec!["a.json", "b.json"]);
        assert!(store.list("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let store = FsArtifactStore::new("/tmp/unused");
        for bad in ["../x", "/etc/passwd", "", "a/./b"] {
            let err = store.read(bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", bad);
        }
    }
}
