//! Artifact storage domain - path-addressed blobs under a single root

mod repository;

pub use repository::{ArtifactStore, ArtifactStoreExt};

#[cfg(test)]
pub use repository::mock;
