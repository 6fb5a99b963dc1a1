//! Regression model domain module

mod bayesian_ridge;
mod params;
mod regressor;

pub use bayesian_ridge::{BayesianRidge, BayesianRidgeConfig};
pub use params::{ParamGrid, ParamSet, ParamValue};
pub use regressor::{
    default_param_grid, BayesianRidgeFamily, EstimatorFamily, Regressor, TrainedModel,
};
