use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Replaces missing numeric values with the training median
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    median: f64,
}

impl MedianImputer {
    pub fn fit(values: &[Option<f64>]) -> Result<Self, DomainError> {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();

        if present.is_empty() {
            return Err(DomainError::validation(
                "Cannot impute a column with no observed values",
            ));
        }

        present.sort_by(f64::total_cmp);
        let mid = present.len() / 2;
        let median = if present.len() % 2 == 0 {
            (present[mid - 1] + present[mid]) / 2.0
        } else {
            present[mid]
        };

        Ok(Self { median })
    }

    pub fn median(&self) -> f64 {
        self.median
    }

    pub fn apply(&self, value: Option<f64>) -> f64 {
        value.unwrap_or(self.median)
    }

    pub fn apply_all(&self, values: &[Option<f64>]) -> Vec<f64> {
        values.iter().map(|v| self.apply(*v)).collect()
    }
}
