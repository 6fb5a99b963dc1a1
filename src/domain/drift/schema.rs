use serde::{Deserialize, Serialize};

use crate::domain::frame::{
    FeatureFrame, EPISODE_LENGTH, GENRE, LISTENING_TIME, PODCAST_NAME, PREDICTION,
    PUBLICATION_DAY, PUBLICATION_TIME,
};
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Columns compared by drift detection, by type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    /// Numeric regression target; the live store calls it `prediction`
    pub target: String,
}

impl Default for DriftSchema {
    fn default() -> Self {
        Self {
            numeric: vec![EPISODE_LENGTH.to_string()],
            categorical: [PODCAST_NAME, GENRE, PUBLICATION_DAY, PUBLICATION_TIME]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            target: LISTENING_TIME.to_string(),
        }
    }
}

impl DriftSchema {
    /// Every compared column in report order
    pub fn columns(&self) -> Vec<(&str, ColumnType)> {
        self.categorical
            .iter()
            .map(|c| (c.as_str(), ColumnType::Categorical))
            .chain(self.numeric.iter().map(|c| (c.as_str(), ColumnType::Numeric)))
            .chain(std::iter::once((self.target.as_str(), ColumnType::Numeric)))
            .collect()
    }

    /// Checks presence and type of every schema column
    pub fn validate(&self, frame: &FeatureFrame) -> Result<(), DomainError> {
        for (name, column_type) in self.columns() {
            match column_type {
                ColumnType::Numeric => frame.numeric(name).map(|_| ())?,
                ColumnType::Categorical => frame.categorical(name).map(|_| ())?,
            }
        }
        Ok(())
    }
}

/// Rename the live prediction column to the reference target name
pub fn align_current(
    mut frame: FeatureFrame,
    prediction_column: &str,
    schema: &DriftSchema,
) -> Result<FeatureFrame, DomainError> {
    frame.rename(prediction_column, &schema.target)?;
    Ok(frame)
}

/// [`align_current`] with the live store's column name
pub fn align_live(frame: FeatureFrame, schema: &DriftSchema) -> Result<FeatureFrame, DomainError> {
    align_current(frame, PREDICTION, schema)
}
