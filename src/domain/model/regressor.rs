//! Regressor seams used by the search engine and inference

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{BayesianRidge, BayesianRidgeConfig, ParamGrid, ParamSet, ParamValue};
use crate::domain::DomainError;

/// A fitted model that can score dense feature rows
pub trait Regressor: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, DomainError>;
}

/// Builds and fits one kind of regressor from a parameter set
pub trait EstimatorFamily: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reject parameter sets this family cannot build
    fn validate(&self, params: &ParamSet) -> Result<(), DomainError>;

    fn fit(
        &self,
        params: &ParamSet,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<TrainedModel, DomainError>;
}

/// Every supported regressor, in persisted form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "estimator", content = "model", rename_all = "snake_case")]
pub enum TrainedModel {
    BayesianRidge(BayesianRidge),
}

impl TrainedModel {
    pub fn estimator(&self) -> &'static str {
        match self {
            Self::BayesianRidge(_) => BayesianRidgeFamily::NAME,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| DomainError::internal(format!("Failed to serialize model: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::registry(format!("Corrupt model artifact: {}", e)))
    }
}

impl Regressor for TrainedModel {
    fn n_features(&self) -> usize {
        match self {
            Self::BayesianRidge(m) => m.n_features(),
        }
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, DomainError> {
        match self {
            Self::BayesianRidge(m) => m.predict(x),
        }
    }
}

/// Bayesian ridge hyperparameters, searchable by name
#[derive(Debug, Clone, Copy, Default)]
pub struct BayesianRidgeFamily;

impl BayesianRidgeFamily {
    pub const NAME: &'static str = "bayesian_ridge";

    fn config(params: &ParamSet) -> Result<BayesianRidgeConfig, DomainError> {
        let mut config = BayesianRidgeConfig::default();

        for (key, value) in params.iter() {
            match key.as_str() {
                "max_iter" => {
                    config.max_iter = value.as_usize().ok_or_else(|| wrong_type(key, value))?
                }
                "tol" => config.tol = float(key, value)?,
                "alpha_1" => config.alpha_1 = float(key, value)?,
                "alpha_2" => config.alpha_2 = float(key, value)?,
                "lambda_1" => config.lambda_1 = float(key, value)?,
                "lambda_2" => config.lambda_2 = float(key, value)?,
                other => {
                    return Err(DomainError::configuration(format!(
                        "Unknown parameter '{}' for {}",
                        other,
                        Self::NAME
                    )));
                }
            }
        }

        Ok(config)
    }
}

fn wrong_type(key: &str, value: &ParamValue) -> DomainError {
    DomainError::configuration(format!("Invalid value {} for parameter '{}'", value, key))
}

fn float(key: &str, value: &ParamValue) -> Result<f64, DomainError> {
    match value {
        ParamValue::Float(v) => Ok(*v),
        ParamValue::Int(_) => Err(wrong_type(key, value)),
    }
}

impl EstimatorFamily for BayesianRidgeFamily {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, params: &ParamSet) -> Result<(), DomainError> {
        Self::config(params).map(|_| ())
    }

    fn fit(
        &self,
        params: &ParamSet,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<TrainedModel, DomainError> {
        let config = Self::config(params)?;
        Ok(TrainedModel::BayesianRidge(BayesianRidge::fit(&config, x, y)?))
    }
}

/// The grid searched by a default training run
pub fn default_param_grid() -> ParamGrid {
    ParamGrid::new()
        .with("max_iter", [300i64, 400, 500])
        .with("tol", [1e-2, 1e-3, 1e-4])
        .with("alpha_1", [1e-4, 1e-5, 1e-6])
        .with("alpha_2", [1e-4, 1e-5, 1e-6])
        .with("lambda_1", [1e-4, 1e-5, 1e-6])
        .with("lambda_2", [1e-4, 1e-5, 1e-6])
}
