use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::DriftThresholds;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub artifacts: ArtifactsConfig,
    pub ingestion: IngestionConfig,
    pub training: TrainingConfig,
    pub registry: RegistryConfig,
    pub database: DatabaseConfig,
    pub drift: DriftThresholds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Layout of the artifact tree, relative to `root`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub root: PathBuf,
    pub train_data: String,
    pub test_data: String,
    pub preprocessor: String,
    pub feature_store_dir: String,
    pub run_config_dir: String,
    pub reports_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Local path or http(s) URL of the raw CSV
    pub raw_data_uri: String,
    pub test_size: f64,
    pub seed: u64,
    pub drop_zero_listening_time: bool,
    /// Download timeout for http(s) sources
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub folds: usize,
    pub factor: usize,
    pub seed: u64,
    pub model_name: String,
    pub register: bool,
    /// Wall-clock budget for the search, unlimited when absent
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    #[default]
    Fs,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub backend: RegistryBackend,
    /// Relative to `artifacts.root` for the filesystem backend
    pub root: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("artifacts"),
            train_data: "train_data.csv".to_string(),
            test_data: "test_data.csv".to_string(),
            preprocessor: "preprocessor_obj.json".to_string(),
            feature_store_dir: "feature_store".to_string(),
            run_config_dir: "run_config".to_string(),
            reports_dir: "reports".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            raw_data_uri: "data/podcast_listening_time.csv".to_string(),
            test_size: 0.3,
            seed: 42,
            drop_zero_listening_time: true,
            timeout_secs: 60,
        }
    }
}

impl IngestionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            folds: 3,
            factor: 3,
            seed: 42,
            model_name: "podcast-listening-time".to_string(),
            register: true,
            deadline_secs: None,
        }
    }
}

impl TrainingConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            root: "registry".to_string(),
            base_url: "http://localhost:5001".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://podcast.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
