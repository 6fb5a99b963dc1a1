//! Drift service - training split versus the live request log

use std::sync::Arc;

use tracing::info;

use crate::domain::dataset::{DatasetStore, SplitSide};
use crate::domain::drift::{align_live, DriftDetector, DriftReport};
use crate::domain::frame::FeatureFrame;
use crate::domain::request_log::{live_frame, RequestStore};
use crate::domain::DomainError;

/// Batch drift check over everything served so far
pub struct DriftService {
    datasets: Arc<dyn DatasetStore>,
    requests: Arc<dyn RequestStore>,
    detector: DriftDetector,
}

impl DriftService {
    pub fn new(
        datasets: Arc<dyn DatasetStore>,
        requests: Arc<dyn RequestStore>,
        detector: DriftDetector,
    ) -> Self {
        Self {
            datasets,
            requests,
            detector,
        }
    }

    /// Reference is the training split; current is the joined request log
    pub async fn run(&self, save: bool) -> Result<DriftReport, DomainError> {
        self.run_inner(save)
            .await
            .map_err(|e| e.with_context("drift"))
    }

    async fn run_inner(&self, save: bool) -> Result<DriftReport, DomainError> {
        let reference = FeatureFrame::from_labeled(&self.datasets.load_split(SplitSide::Train).await?);

        let observations = self.requests.live_observations().await?;
        let current = align_live(live_frame(&observations)?, self.detector.schema())?;

        info!(
            reference_rows = reference.n_rows(),
            current_rows = current.n_rows(),
            "Running drift detection"
        );
        self.detector.detect(&reference, &current, save).await
    }
}
