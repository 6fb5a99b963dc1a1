//! Registry infrastructure - model registries and run pointers

mod fs_registry;
mod http_registry;
mod run_params;

pub use fs_registry::FsModelRegistry;
pub use http_registry::HttpModelRegistry;
pub use run_params::FsRunParamsStore;
