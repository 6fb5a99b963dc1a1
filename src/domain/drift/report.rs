use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ColumnType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTest {
    KolmogorovSmirnov,
    Wasserstein,
    ChiSquare,
    JensenShannon,
}

impl StatTest {
    /// p-value tests flag drift below the threshold, distances at or above it
    pub fn is_p_value(&self) -> bool {
        matches!(self, Self::KolmogorovSmirnov | Self::ChiSquare)
    }
}

/// Outcome of one column's test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column: String,
    pub column_type: ColumnType,
    pub stat_test: StatTest,
    /// p-value for KS and chi-square, distance otherwise
    pub statistic: f64,
    pub threshold: f64,
    pub drift_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub reference_rows: usize,
    pub current_rows: usize,
    pub columns: Vec<ColumnDrift>,
    pub drifted_columns: usize,
    pub share_of_drifted_columns: f64,
    pub dataset_drift: bool,
}

impl DriftReport {
    pub fn column(&self, name: &str) -> Option<&ColumnDrift> {
        self.columns.iter().find(|c| c.column == name)
    }
}
