//! The persisted preprocessing transform

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{DecisionTreeEncoder, MedianImputer, StandardScaler, TreeEncoderConfig};
use crate::domain::frame::{ColumnData, FeatureFrame, EPISODE_LENGTH};
use crate::domain::DomainError;

const NUMERIC_PREFIX: &str = "num__";
const CATEGORICAL_PREFIX: &str = "cat__";

/// Median imputation followed by standard scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPipeline {
    column: String,
    imputer: MedianImputer,
    scaler: StandardScaler,
}

impl NumericPipeline {
    fn fit(column: &str, values: &[Option<f64>]) -> Result<Self, DomainError> {
        let imputer = MedianImputer::fit(values)
            .map_err(|e| e.with_context(&format!("fit numeric column '{}'", column)))?;
        let scaler = StandardScaler::fit(&imputer.apply_all(values))?;

        Ok(Self {
            column: column.to_string(),
            imputer,
            scaler,
        })
    }

    fn apply(&self, value: Option<f64>) -> f64 {
        self.scaler.apply(self.imputer.apply(value))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn median(&self) -> f64 {
        self.imputer.median()
    }
}

/// Decision-tree encoding followed by standard scaling, one column at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalPipeline {
    encoder: DecisionTreeEncoder,
    scaler: StandardScaler,
}

impl CategoricalPipeline {
    fn fit(
        column: &str,
        values: &[String],
        target: &[f64],
        config: &TreeEncoderConfig,
    ) -> Result<Self, DomainError> {
        let encoder = DecisionTreeEncoder::fit(column, values, target, config)?;
        let encoded: Vec<f64> = values.iter().map(|v| encoder.encode(v)).collect();
        let scaler = StandardScaler::fit(&encoded)?;
        Ok(Self { encoder, scaler })
    }

    fn apply(&self, value: &str) -> f64 {
        self.scaler.apply(self.encoder.encode(value))
    }

    pub fn column(&self) -> &str {
        self.encoder.column()
    }

    pub fn encoder(&self) -> &DecisionTreeEncoder {
        &self.encoder
    }
}

/// Preprocessing fit once on training data and applied unchanged afterwards
///
/// The numeric feature comes first in the output, followed by the
/// categorical features in the order they appeared in the training frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    numeric: NumericPipeline,
    categorical: Vec<CategoricalPipeline>,
    /// Training run that fit this transform, set when it is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
}

impl FittedTransform {
    pub fn fit(frame: &FeatureFrame, target: &[f64]) -> Result<Self, DomainError> {
        Self::fit_with(frame, target, &TreeEncoderConfig::default())
    }

    pub fn fit_with(
        frame: &FeatureFrame,
        target: &[f64],
        config: &TreeEncoderConfig,
    ) -> Result<Self, DomainError> {
        if frame.is_empty() {
            return Err(DomainError::validation(
                "Cannot fit the transform on an empty frame",
            ));
        }

        if frame.n_rows() != target.len() {
            return Err(DomainError::validation(format!(
                "Frame has {} rows but target has {}",
                frame.n_rows(),
                target.len()
            )));
        }

        if let Some(bad) = target.iter().position(|t| !t.is_finite()) {
            return Err(DomainError::validation(format!(
                "Target value at row {} is not finite",
                bad
            )));
        }

        let numeric = NumericPipeline::fit(EPISODE_LENGTH, frame.numeric(EPISODE_LENGTH)?)?;

        let mut categorical = Vec::new();
        for column in frame.columns().iter().filter(|c| c.name != EPISODE_LENGTH) {
            match &column.data {
                ColumnData::Categorical(values) => {
                    categorical.push(CategoricalPipeline::fit(&column.name, values, target, config)?)
                }
                ColumnData::Numeric(_) => {
                    return Err(DomainError::schema(format!(
                        "Unexpected numeric column '{}'",
                        column.name
                    )));
                }
            }
        }

        let transform = Self {
            numeric,
            categorical,
            run_id: None,
        };

        info!(
            rows = frame.n_rows(),
            features = transform.n_features_out(),
            "Fitted preprocessing transform"
        );

        Ok(transform)
    }

    /// Apply the learned parameters to a frame
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>, DomainError> {
        let n_rows = frame.n_rows();
        let mut out = Array2::<f64>::zeros((n_rows, self.n_features_out()));

        let lengths = frame.numeric(self.numeric.column())?;
        for (row, value) in lengths.iter().enumerate() {
            out[[row, 0]] = self.numeric.apply(*value);
        }

        for (offset, pipeline) in self.categorical.iter().enumerate() {
            let values = frame.categorical(pipeline.column())?;
            for (row, value) in values.iter().enumerate() {
                out[[row, offset + 1]] = pipeline.apply(value);
            }
        }

        Ok(out)
    }

    pub fn n_features_out(&self) -> usize {
        1 + self.categorical.len()
    }

    pub fn input_columns(&self) -> Vec<&str> {
        std::iter::once(self.numeric.column())
            .chain(self.categorical.iter().map(|p| p.column()))
            .collect()
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        std::iter::once(format!("{}{}", NUMERIC_PREFIX, self.numeric.column()))
            .chain(
                self.categorical
                    .iter()
                    .map(|p| format!("{}{}", CATEGORICAL_PREFIX, p.column())),
            )
            .collect()
    }

    pub fn numeric(&self) -> &NumericPipeline {
        &self.numeric
    }

    pub fn categorical(&self) -> &[CategoricalPipeline] {
        &self.categorical
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| DomainError::internal(format!("Failed to serialize transform: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes)
            .map_err(|e| DomainError::storage(format!("Corrupt transform artifact: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::derive_all;
    use crate::domain::frame::{GENRE, PODCAST_NAME, PUB_DAY_TIME};
    use crate::domain::record::RawRecord;
    use crate::domain::ErrorKind;

    fn record(name: &str, length: Option<f64>, genre: &str, day: &str) -> RawRecord {
        RawRecord::builder()
            .podcast_name(name)
            .maybe_episode_length_minutes(length)
            .genre(genre)
            .publication_day(day)
            .publication_time("Morning")
            .build()
            .unwrap()
    }

    fn training_frame() -> (FeatureFrame, Vec<f64>) {
        let records = vec![
            record("Mystery Matters", Some(60.0), "True Crime", "Monday"),
            record("Joke Junction", Some(30.0), "Comedy", "Tuesday"),
            record("Mystery Matters", None, "True Crime", "Monday"),
            record("Study Sessions", Some(45.0), "Education", "Friday"),
            record("Joke Junction", Some(25.0), "Comedy", "Tuesday"),
            record("Study Sessions", Some(50.0), "Education", "Friday"),
        ];
        let target = vec![50.0, 20.0, 48.0, 35.0, 18.0, 40.0];
        (FeatureFrame::from_engineered(&derive_all(&records)), target)
    }

    #[test]
    fn test_output_layout() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();

        assert_eq!(transform.n_features_out(), 4);
        assert_eq!(
            transform.feature_names_out(),
            vec![
                "num__Episode_Length_minutes",
                "cat__Podcast_Name",
                "cat__Genre",
                "cat__Pub_Day_Time"
            ]
        );
        assert_eq!(
            transform.input_columns(),
            vec![EPISODE_LENGTH, PODCAST_NAME, GENRE, PUB_DAY_TIME]
        );

        let matrix = transform.transform(&frame).unwrap();
        assert_eq!(matrix.dim(), (6, 4));
        assert!(matrix.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_length_is_imputed_with_median() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();
        assert_eq!(transform.numeric().median(), 45.0);

        let matrix = transform.transform(&frame).unwrap();
        let imputed = matrix[[2, 0]];
        let at_median = matrix[[3, 0]];
        assert_eq!(imputed, at_median);
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();

        let restored = FittedTransform::from_bytes(&transform.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, transform);

        let before = transform.transform(&frame).unwrap();
        let after = restored.transform(&frame).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_run_id_survives_persistence() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();
        assert_eq!(transform.run_id(), None);

        let tagged = transform.with_run_id("run-42");
        let restored = FittedTransform::from_bytes(&tagged.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.run_id(), Some("run-42"));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (frame, target) = training_frame();
        let first = FittedTransform::fit(&frame, &target).unwrap();
        let second = FittedTransform::fit(&frame, &target).unwrap();
        assert_eq!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
    }

    #[test]
    fn test_unseen_category_transforms() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();

        let unseen = FeatureFrame::from_engineered(&derive_all(&[record(
            "Brand New Show",
            Some(40.0),
            "Music",
            "Sunday",
        )]));
        let matrix = transform.transform(&unseen).unwrap();
        assert!(matrix.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let (frame, target) = training_frame();
        let transform = FittedTransform::fit(&frame, &target).unwrap();

        let partial = frame.select(&[EPISODE_LENGTH, PODCAST_NAME, GENRE]).unwrap();
        let err = transform.transform(&partial).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let (frame, target) = training_frame();

        let err = FittedTransform::fit(&frame, &target[..3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut bad_target = target.clone();
        bad_target[0] = f64::NAN;
        let err = FittedTransform::fit(&frame, &bad_target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = FittedTransform::fit(&FeatureFrame::new(), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let no_length = frame.select(&[PODCAST_NAME, GENRE]).unwrap();
        let err = FittedTransform::fit(&no_length, &target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
