//! Registry entities

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const URI_SCHEME: &str = "models:/";
const RUN_PARAMS_PREFIX: &str = "run_params_";
const RUN_PARAMS_EXTENSION: &str = ".json";
const RUN_PARAMS_TIMESTAMP: &str = "%Y%m%d_%H-%M-%S";

/// Maximum length for model names
pub const MAX_MODEL_NAME_LENGTH: usize = 100;

/// Letters, digits, '-', '_' and '.', never starting with '.'
static MODEL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").unwrap());

/// Registry address of one model version, `models:/<name>/<version>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelUri {
    name: String,
    version: u32,
}

impl ModelUri {
    pub fn new(name: impl Into<String>, version: u32) -> Result<Self, DomainError> {
        let name = name.into();
        validate_model_name(&name)?;
        Ok(Self { name, version })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Model names become directory names, so keep them to a safe alphabet
pub fn validate_model_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation("Model name cannot be empty"));
    }

    if name.len() > MAX_MODEL_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Model name exceeds {} characters",
            MAX_MODEL_NAME_LENGTH
        )));
    }

    if !MODEL_NAME_PATTERN.is_match(name) {
        return Err(DomainError::validation(format!(
            "Invalid model name '{}': use letters, digits, '-', '_' or '.'",
            name
        )));
    }

    Ok(())
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", URI_SCHEME, self.name, self.version)
    }
}

impl FromStr for ModelUri {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(URI_SCHEME)
            .ok_or_else(|| DomainError::registry(format!("Invalid model URI '{}'", s)))?;
        let (name, version) = rest
            .rsplit_once('/')
            .ok_or_else(|| DomainError::registry(format!("Invalid model URI '{}'", s)))?;
        let version = version
            .parse::<u32>()
            .map_err(|_| DomainError::registry(format!("Invalid model version in '{}'", s)))?;

        Self::new(name, version).map_err(|e| DomainError::registry(e.message().to_string()))
    }
}

impl TryFrom<String> for ModelUri {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelUri> for String {
    fn from(uri: ModelUri) -> Self {
        uri.to_string()
    }
}

/// A model version as recorded by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub uri: ModelUri,
    pub run_id: String,
    pub estimator: String,
    pub created_at: DateTime<Utc>,
}

/// Pointer to the model produced by one completed training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub model_uri: ModelUri,
    pub model_name: String,
    pub version: u32,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
}

impl RunParameters {
    pub fn new(registered: &RegisteredModel) -> Self {
        Self {
            model_uri: registered.uri.clone(),
            model_name: registered.uri.name().to_string(),
            version: registered.uri.version(),
            run_id: registered.run_id.clone(),
            created_at: Utc::now(),
        }
    }

    /// `run_params_<YYYYmmdd>_<HH-MM-SS>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}{}{}",
            RUN_PARAMS_PREFIX,
            self.created_at.format(RUN_PARAMS_TIMESTAMP),
            RUN_PARAMS_EXTENSION
        )
    }

    /// Timestamp embedded in a pointer file name, if it is one
    pub fn parse_file_timestamp(file_name: &str) -> Option<NaiveDateTime> {
        let stem = file_name
            .strip_prefix(RUN_PARAMS_PREFIX)?
            .strip_suffix(RUN_PARAMS_EXTENSION)?;
        NaiveDateTime::parse_from_str(stem, RUN_PARAMS_TIMESTAMP).ok()
    }
}
