//! Storage infrastructure - artifact store implementations

mod fs;

pub use fs::FsArtifactStore;
