//! Preprocessing transform domain module

mod fitted;
mod imputer;
mod scaler;
mod tree_encoder;

pub use fitted::{CategoricalPipeline, FittedTransform, NumericPipeline};
pub use imputer::MedianImputer;
pub use scaler::StandardScaler;
pub use tree_encoder::{DecisionTreeEncoder, TreeEncoderConfig};
