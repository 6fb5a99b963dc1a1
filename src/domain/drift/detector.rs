//! Reference-versus-current drift detection

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::stats;
use super::{ColumnDrift, ColumnType, DriftReport, DriftSchema, StatTest};
use crate::domain::frame::FeatureFrame;
use crate::domain::storage::ArtifactStore;
use crate::domain::DomainError;

const REPORT_PREFIX: &str = "drift_report_";
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Test selection cut-off and per-test thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftThresholds {
    /// Reference sizes up to this use p-value tests, larger ones distances
    pub sample_size_threshold: usize,
    pub p_value: f64,
    pub wasserstein: f64,
    pub jensen_shannon: f64,
    /// Share of drifted columns at which the whole dataset counts as drifted
    pub dataset_drift_share: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            sample_size_threshold: 1000,
            p_value: 0.05,
            wasserstein: 0.1,
            jensen_shannon: 0.1,
            dataset_drift_share: 0.5,
        }
    }
}

pub struct DriftDetector {
    schema: DriftSchema,
    thresholds: DriftThresholds,
    store: Arc<dyn ArtifactStore>,
    reports_dir: String,
}

impl std::fmt::Debug for DriftDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftDetector")
            .field("schema", &self.schema)
            .field("thresholds", &self.thresholds)
            .field("reports_dir", &self.reports_dir)
            .finish()
    }
}

impl DriftDetector {
    pub fn new(store: Arc<dyn ArtifactStore>, reports_dir: impl Into<String>) -> Self {
        Self {
            schema: DriftSchema::default(),
            thresholds: DriftThresholds::default(),
            store,
            reports_dir: reports_dir.into(),
        }
    }

    pub fn with_schema(mut self, schema: DriftSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_thresholds(mut self, thresholds: DriftThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn schema(&self) -> &DriftSchema {
        &self.schema
    }

    /// Run every column test without persisting anything
    pub fn evaluate(
        &self,
        reference: &FeatureFrame,
        current: &FeatureFrame,
    ) -> Result<DriftReport, DomainError> {
        if reference.is_empty() {
            return Err(DomainError::validation("Reference data is empty"));
        }
        if current.is_empty() {
            return Err(DomainError::validation("Current data is empty"));
        }

        self.schema.validate(reference)?;
        self.schema.validate(current)?;

        let large = reference.n_rows() > self.thresholds.sample_size_threshold;
        let mut columns = Vec::new();

        for (name, column_type) in self.schema.columns() {
            let (stat_test, statistic) = match column_type {
                ColumnType::Numeric => {
                    let ref_values = observed(reference.numeric(name)?, name, "reference")?;
                    let cur_values = observed(current.numeric(name)?, name, "current")?;
                    if large {
                        (
                            StatTest::Wasserstein,
                            stats::normed_wasserstein(&ref_values, &cur_values),
                        )
                    } else {
                        (
                            StatTest::KolmogorovSmirnov,
                            stats::ks_two_sample(&ref_values, &cur_values).1,
                        )
                    }
                }
                ColumnType::Categorical => {
                    let ref_values = reference.categorical(name)?;
                    let cur_values = current.categorical(name)?;
                    if large {
                        (
                            StatTest::JensenShannon,
                            stats::jensen_shannon(ref_values, cur_values),
                        )
                    } else {
                        (
                            StatTest::ChiSquare,
                            stats::chi_square(ref_values, cur_values).1,
                        )
                    }
                }
            };

            let threshold = match stat_test {
                StatTest::KolmogorovSmirnov | StatTest::ChiSquare => self.thresholds.p_value,
                StatTest::Wasserstein => self.thresholds.wasserstein,
                StatTest::JensenShannon => self.thresholds.jensen_shannon,
            };
            let drift_detected = if stat_test.is_p_value() {
                statistic < threshold
            } else {
                statistic >= threshold
            };

            columns.push(ColumnDrift {
                column: name.to_string(),
                column_type,
                stat_test,
                statistic,
                threshold,
                drift_detected,
            });
        }

        let drifted_columns = columns.iter().filter(|c| c.drift_detected).count();
        let share = drifted_columns as f64 / columns.len() as f64;
        let created_at = Utc::now();

        Ok(DriftReport {
            name: format!("{}{}", REPORT_PREFIX, created_at.format("%Y%m%d_%H%M%S_%3f")),
            created_at,
            reference_rows: reference.n_rows(),
            current_rows: current.n_rows(),
            columns,
            drifted_columns,
            share_of_drifted_columns: share,
            dataset_drift: share >= self.thresholds.dataset_drift_share,
        })
    }

    /// Evaluate and, with `save`, write the report under a fresh name
    pub async fn detect(
        &self,
        reference: &FeatureFrame,
        current: &FeatureFrame,
        save: bool,
    ) -> Result<DriftReport, DomainError> {
        let mut report = self.evaluate(reference, current)?;

        info!(
            drifted = report.drifted_columns,
            share = report.share_of_drifted_columns,
            dataset_drift = report.dataset_drift,
            "Drift detection completed"
        );

        if save {
            self.save(&mut report).await?;
        }

        Ok(report)
    }

    async fn save(&self, report: &mut DriftReport) -> Result<(), DomainError> {
        let base = report.name.clone();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            if attempt > 0 {
                report.name = format!("{}_{}", base, attempt);
            }

            let path = format!("{}/{}.json", self.reports_dir, report.name);
            let bytes = serde_json::to_vec_pretty(report).map_err(|e| {
                DomainError::internal(format!("Failed to serialize drift report: {}", e))
            })?;

            if self.store.create_new(&path, &bytes).await? {
                info!(path = %path, "Saved drift report");
                return Ok(());
            }

            warn!(path = %path, "Drift report name taken, trying next suffix");
        }

        Err(DomainError::storage(format!(
            "No free drift report name for '{}'",
            base
        )))
    }
}

fn observed(values: &[Option<f64>], column: &str, side: &str) -> Result<Vec<f64>, DomainError> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return Err(DomainError::validation(format!(
            "Column '{}' has no observed values in the {} data",
            column, side
        )));
    }
    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{
        ColumnData, EPISODE_LENGTH, GENRE, LISTENING_TIME, PODCAST_NAME, PUBLICATION_DAY,
        PUBLICATION_TIME,
    };
    use crate::domain::storage::mock::MockArtifactStore;
    use crate::domain::ErrorKind;

    const DAYS: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];

    fn frame(n: usize, length_scale: f64) -> FeatureFrame {
        let cat = |f: &dyn Fn(usize) -> String| ColumnData::Categorical((0..n).map(f).collect());
        FeatureFrame::new()
            .with_column(PODCAST_NAME, cat(&|i| format!("Show {}", i % 5)))
            .unwrap()
            .with_column(
                EPISODE_LENGTH,
                ColumnData::Numeric((0..n).map(|i| Some((i % 50) as f64 * length_scale)).collect()),
            )
            .unwrap()
            .with_column(GENRE, cat(&|i| ["Comedy", "News", "Music"][i % 3].to_string()))
            .unwrap()
            .with_column(PUBLICATION_DAY, cat(&|i| DAYS[i % 7].to_string()))
            .unwrap()
            .with_column(
                PUBLICATION_TIME,
                cat(&|i| ["Morning", "Night"][i % 2].to_string()),
            )
            .unwrap()
            .with_column(
                LISTENING_TIME,
                ColumnData::Numeric((0..n).map(|i| Some((i % 40) as f64)).collect()),
            )
            .unwrap()
    }

    fn detector(store: Arc<MockArtifactStore>) -> DriftDetector {
        DriftDetector::new(store, "reports")
    }

    #[tokio::test]
    async fn test_identical_frames_show_no_drift() {
        let store = Arc::new(MockArtifactStore::new());
        let reference = frame(300, 1.0);

        let report = detector(store).detect(&reference, &reference, false).await.unwrap();
        assert_eq!(report.drifted_columns, 0);
        assert!(!report.dataset_drift);
        assert_eq!(report.columns.len(), 6);
        assert_eq!(
            report.column(EPISODE_LENGTH).unwrap().stat_test,
            StatTest::KolmogorovSmirnov
        );
        assert_eq!(report.column(GENRE).unwrap().stat_test, StatTest::ChiSquare);
    }

    #[tokio::test]
    async fn test_scaled_numeric_column_drifts() {
        let store = Arc::new(MockArtifactStore::new());
        let report = detector(store)
            .detect(&frame(300, 1.0), &frame(300, 10.0), false)
            .await
            .unwrap();

        assert!(report.column(EPISODE_LENGTH).unwrap().drift_detected);
        assert!(!report.column(GENRE).unwrap().drift_detected);
        assert_eq!(report.drifted_columns, 1);
        assert!(!report.dataset_drift);
    }

    #[tokio::test]
    async fn test_large_reference_uses_distances() {
        let store = Arc::new(MockArtifactStore::new());
        let report = detector(store)
            .detect(&frame(1200, 1.0), &frame(200, 10.0), false)
            .await
            .unwrap();

        let length = report.column(EPISODE_LENGTH).unwrap();
        assert_eq!(length.stat_test, StatTest::Wasserstein);
        assert!(length.drift_detected);
        assert_eq!(
            report.column(PODCAST_NAME).unwrap().stat_test,
            StatTest::JensenShannon
        );
    }

    #[tokio::test]
    async fn test_empty_current_fails_without_writing() {
        let store = Arc::new(MockArtifactStore::new());
        let err = detector(store.clone())
            .detect(&frame(10, 1.0), &frame(0, 1.0), true)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.paths().is_empty());
    }

    #[tokio::test]
    async fn test_report_names_never_collide() {
        let store = Arc::new(MockArtifactStore::new());
        let detector = detector(store.clone());
        let reference = frame(30, 1.0);

        let mut names = Vec::new();
        for _ in 0..3 {
            let report = detector.detect(&reference, &reference, true).await.unwrap();
            names.push(report.name);
        }

        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert_eq!(store.paths().len(), 3);
        assert!(store.paths().iter().all(|p| p.starts_with("reports/drift_report_")));
    }

    #[tokio::test]
    async fn test_missing_column_is_schema_error() {
        let store = Arc::new(MockArtifactStore::new());
        let reference = frame(30, 1.0);
        let current = reference.select(&[PODCAST_NAME, GENRE]).unwrap();

        let err = detector(store).detect(&reference, &current, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
