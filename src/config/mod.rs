//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, ArtifactsConfig, DatabaseConfig, IngestionConfig, LogFormat, LoggingConfig,
    RegistryBackend, RegistryConfig, ServerConfig, TrainingConfig,
};
