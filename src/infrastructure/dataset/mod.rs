//! Dataset infrastructure - CSV source and split/feature persistence

mod csv_source;
mod fs_store;
mod row;

pub use csv_source::CsvDatasetSource;
pub use fs_store::CsvDatasetStore;
pub use row::{parse_labeled, write_labeled, REQUIRED_COLUMNS};
