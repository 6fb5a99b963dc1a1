//! Data drift domain module

mod detector;
mod report;
mod schema;
pub mod stats;

pub use detector::{DriftDetector, DriftThresholds};
pub use report::{ColumnDrift, DriftReport, StatTest};
pub use schema::{align_current, align_live, ColumnType, DriftSchema};
