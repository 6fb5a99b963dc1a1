//! Hyperparameter search domain module

mod cv;
mod halving;

pub use cv::{Fold, KFold};
pub use halving::{search, HalvingIteration, SearchConfig, SearchContext, SearchOutcome};
