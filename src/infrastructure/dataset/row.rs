//! CSV row layout shared by the raw dataset and the split files

use serde::{Deserialize, Serialize};

use crate::domain::frame::{
    EPISODE_LENGTH, GENRE, LISTENING_TIME, PODCAST_NAME, PUBLICATION_DAY, PUBLICATION_TIME,
};
use crate::domain::record::{LabeledRecord, RawRecord};
use crate::domain::DomainError;

/// Columns a labelled CSV must carry; any others are ignored
pub const REQUIRED_COLUMNS: [&str; 6] = [
    PODCAST_NAME,
    EPISODE_LENGTH,
    GENRE,
    PUBLICATION_DAY,
    PUBLICATION_TIME,
    LISTENING_TIME,
];

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Podcast_Name")]
    podcast_name: String,
    #[serde(rename = "Episode_Length_minutes")]
    episode_length_minutes: Option<f64>,
    #[serde(rename = "Genre")]
    genre: String,
    #[serde(rename = "Publication_Day")]
    publication_day: String,
    #[serde(rename = "Publication_Time")]
    publication_time: String,
    #[serde(rename = "Listening_Time_minutes")]
    listening_time_minutes: f64,
}

impl CsvRow {
    fn into_record(self) -> Result<LabeledRecord, DomainError> {
        let record = RawRecord::builder()
            .podcast_name(self.podcast_name)
            .maybe_episode_length_minutes(self.episode_length_minutes)
            .genre(self.genre)
            .publication_day(self.publication_day)
            .publication_time(self.publication_time)
            .build()?;

        Ok(LabeledRecord::new(record, self.listening_time_minutes)?)
    }

    fn from_record(labeled: &LabeledRecord) -> Self {
        let record = &labeled.record;
        Self {
            podcast_name: record.podcast_name.clone(),
            episode_length_minutes: record.episode_length_minutes,
            genre: record.genre.clone(),
            publication_day: record.publication_day.to_string(),
            publication_time: record.publication_time.to_string(),
            listening_time_minutes: labeled.listening_time_minutes,
        }
    }
}

/// Parse labelled rows by header name
pub fn parse_labeled(bytes: &[u8]) -> Result<Vec<LabeledRecord>, DomainError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DomainError::schema(format!("Unreadable CSV header: {}", e)))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !headers.iter().any(|h| h == *name))
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::schema(format!(
            "CSV is missing columns: {}",
            missing.join(", ")
        )));
    }

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| DomainError::validation(e.to_string()))
                .and_then(CsvRow::into_record)
                .map_err(|e| e.with_context(&format!("row {}", i + 1)))
        })
        .collect()
}

/// Render labelled rows with the canonical header
pub fn write_labeled(records: &[LabeledRecord]) -> Result<Vec<u8>, DomainError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if records.is_empty() {
        writer.write_record(REQUIRED_COLUMNS).map_err(csv_error)?;
    }
    for record in records {
        writer
            .serialize(CsvRow::from_record(record))
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| DomainError::internal(format!("Failed to flush CSV: {}", e)))
}

pub(super) fn csv_error(e: csv::Error) -> DomainError {
    DomainError::internal(format!("Failed to write CSV: {}", e))
}
