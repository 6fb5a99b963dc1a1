use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::frame::{
    ColumnData, FeatureFrame, EPISODE_LENGTH, GENRE, PODCAST_NAME, PREDICTION, PUBLICATION_DAY,
    PUBLICATION_TIME,
};
use crate::domain::record::RawRecord;
use crate::domain::DomainError;

/// One row of the `data` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedRequest {
    pub id: i64,
    pub podcast_name: String,
    pub episode_length_minutes: f64,
    pub genre: String,
    pub publication_day: String,
    pub publication_time: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the `predictions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub pred_id: i64,
    pub data_id: i64,
    pub prediction: f64,
    pub created_at: DateTime<Utc>,
}

/// A submitted request joined with its prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveObservation {
    pub request: SubmittedRequest,
    pub prediction: f64,
}

/// Columns persisted for a request, checked before anything is written
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub podcast_name: String,
    pub episode_length_minutes: f64,
    pub genre: String,
    pub publication_day: String,
    pub publication_time: String,
}

impl NewRequest {
    /// The `data` table requires an episode length
    pub fn from_record(record: &RawRecord) -> Result<Self, DomainError> {
        let episode_length_minutes = record.episode_length_minutes.ok_or_else(|| {
            DomainError::validation("Episode_Length_minutes is required for a stored request")
        })?;

        Ok(Self {
            podcast_name: record.podcast_name.clone(),
            episode_length_minutes,
            genre: record.genre.clone(),
            publication_day: record.publication_day.to_string(),
            publication_time: record.publication_time.to_string(),
        })
    }
}

/// Frame of live observations with the raw feature columns plus `prediction`
pub fn live_frame(rows: &[LiveObservation]) -> Result<FeatureFrame, DomainError> {
    let text = |f: fn(&SubmittedRequest) -> &str| {
        ColumnData::Categorical(rows.iter().map(|r| f(&r.request).to_string()).collect())
    };

    FeatureFrame::new()
        .with_column(PODCAST_NAME, text(|r| r.podcast_name.as_str()))?
        .with_column(
            EPISODE_LENGTH,
            ColumnData::Numeric(
                rows.iter()
                    .map(|r| Some(r.request.episode_length_minutes))
                    .collect(),
            ),
        )?
        .with_column(GENRE, text(|r| r.genre.as_str()))?
        .with_column(PUBLICATION_DAY, text(|r| r.publication_day.as_str()))?
        .with_column(PUBLICATION_TIME, text(|r| r.publication_time.as_str()))?
        .with_column(
            PREDICTION,
            ColumnData::Numeric(rows.iter().map(|r| Some(r.prediction)).collect()),
        )
}
