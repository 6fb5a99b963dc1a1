//! Dataset domain module

mod repository;
mod split;

pub use repository::{DatasetSource, DatasetStore, SplitSide};
pub use split::{train_test_split, TrainTestSplit};

#[cfg(test)]
pub use repository::MockDatasetSource;
