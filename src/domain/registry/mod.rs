//! Model registry domain module

mod entity;
mod repository;

pub use entity::{validate_model_name, ModelUri, RegisteredModel, RunParameters};
pub use repository::{ModelRegistry, RunParamsStore};

#[cfg(test)]
pub use repository::{MockModelRegistry, MockRunParamsStore};
