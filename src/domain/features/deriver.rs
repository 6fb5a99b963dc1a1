//! Feature derivation
//!
//! The only engineered feature is the publication day and time merged into a
//! single `Pub_Day_Time` category, e.g. `Monday_Morning`.

use tracing::debug;

use crate::domain::frame::{
    ColumnData, FeatureFrame, LISTENING_TIME, PUBLICATION_DAY, PUBLICATION_TIME, PUB_DAY_TIME,
};
use crate::domain::record::{EngineeredRecord, LabeledRecord, RawRecord};
use crate::domain::DomainError;

/// Separator between the day and time parts of `Pub_Day_Time`
pub const PUB_DAY_TIME_SEPARATOR: &str = "_";

fn join_day_time(day: &str, time: &str) -> String {
    format!("{}{}{}", day, PUB_DAY_TIME_SEPARATOR, time)
}

/// Derive the engineered record for a single raw record
pub fn derive(record: &RawRecord) -> EngineeredRecord {
    EngineeredRecord {
        podcast_name: record.podcast_name.clone(),
        episode_length_minutes: record.episode_length_minutes,
        genre: record.genre.clone(),
        pub_day_time: join_day_time(
            record.publication_day.as_str(),
            record.publication_time.as_str(),
        ),
    }
}

/// Derive engineered records for a batch
pub fn derive_all(records: &[RawRecord]) -> Vec<EngineeredRecord> {
    records.iter().map(derive).collect()
}

/// Replace `Publication_Day` and `Publication_Time` with `Pub_Day_Time`
///
/// The merged column takes the position of `Publication_Day`. Other columns
/// are left untouched.
pub fn derive_frame(frame: &FeatureFrame) -> Result<FeatureFrame, DomainError> {
    let days = frame.categorical(PUBLICATION_DAY).map_err(|_| {
        DomainError::validation(format!("Column '{}' is required", PUBLICATION_DAY))
    })?;
    let times = frame.categorical(PUBLICATION_TIME).map_err(|_| {
        DomainError::validation(format!("Column '{}' is required", PUBLICATION_TIME))
    })?;

    if frame.column(PUB_DAY_TIME).is_some() {
        return Err(DomainError::validation(format!(
            "Column '{}' already present alongside '{}'/'{}'",
            PUB_DAY_TIME, PUBLICATION_DAY, PUBLICATION_TIME
        )));
    }

    let merged: Vec<String> = days
        .iter()
        .zip(times)
        .map(|(day, time)| join_day_time(day, time))
        .collect();

    let mut out = FeatureFrame::new();

    for column in frame.columns() {
        match column.name.as_str() {
            PUBLICATION_DAY => {
                out.push_column(PUB_DAY_TIME, ColumnData::Categorical(merged.clone()))?
            }
            PUBLICATION_TIME => {}
            _ => out.push_column(column.name.clone(), column.data.clone())?,
        }
    }

    debug!(rows = out.n_rows(), "Derived Pub_Day_Time feature");
    Ok(out)
}

/// Drop every row whose listening time is exactly zero
pub fn drop_zero_listening_time(records: Vec<LabeledRecord>) -> Vec<LabeledRecord> {
    let before = records.len();
    let kept: Vec<LabeledRecord> = records
        .into_iter()
        .filter(|r| r.listening_time_minutes != 0.0)
        .collect();

    debug!(
        dropped = before - kept.len(),
        column = LISTENING_TIME,
        "Dropped zero listening-time rows"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{EPISODE_LENGTH, GENRE, PODCAST_NAME};
    use crate::domain::record::{PublicationDay, PublicationTime};
    use crate::domain::ErrorKind;

    fn raw(day: &str, time: &str) -> RawRecord {
        RawRecord::builder()
            .podcast_name("Study Sessions")
            .episode_length_minutes(60.0)
            .genre("Comedy")
            .publication_day(day)
            .publication_time(time)
            .build()
            .unwrap()
    }

    #[test]
    fn test_derive_concatenates_day_and_time() {
        let engineered = derive(&raw("Monday", "Morning"));
        assert_eq!(engineered.pub_day_time, "Monday_Morning");
        assert_eq!(engineered.podcast_name, "Study Sessions");
        assert_eq!(engineered.episode_length_minutes, Some(60.0));
    }

    #[test]
    fn test_derive_frame_has_exactly_one_merged_column_for_all_day_time_pairs() {
        let records: Vec<RawRecord> = PublicationDay::ALL
            .iter()
            .flat_map(|d| PublicationTime::ALL.iter().map(move |t| raw(d.as_str(), t.as_str())))
            .collect();

        let derived = derive_frame(&FeatureFrame::from_raw(&records)).unwrap();
        let names = derived.column_names();

        assert_eq!(names.iter().filter(|n| **n == PUB_DAY_TIME).count(), 1);
        assert!(!names.contains(&PUBLICATION_DAY));
        assert!(!names.contains(&PUBLICATION_TIME));
        assert_eq!(names, vec![PODCAST_NAME, EPISODE_LENGTH, GENRE, PUB_DAY_TIME]);
        assert_eq!(derived.n_rows(), 28);
    }

    #[test]
    fn test_derive_frame_matches_record_derivation() {
        let records = vec![raw("Friday", "Night"), raw("Sunday", "Afternoon")];
        let from_frame = derive_frame(&FeatureFrame::from_raw(&records)).unwrap();
        let from_records = FeatureFrame::from_engineered(&derive_all(&records));
        assert_eq!(from_frame, from_records);
    }

    #[test]
    fn test_derive_frame_requires_day_and_time() {
        let frame = FeatureFrame::from_raw(&[raw("Monday", "Morning")]);
        let mut without_time = frame.clone();
        without_time.remove(PUBLICATION_TIME).unwrap();

        let err = derive_frame(&without_time).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut without_day = frame;
        without_day.remove(PUBLICATION_DAY).unwrap();
        assert_eq!(derive_frame(&without_day).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_drop_zero_listening_time_removes_only_zero_rows() {
        let rows: Vec<LabeledRecord> = [0.0, 12.5, 0.0, 0.1, 45.0]
            .iter()
            .map(|&t| LabeledRecord::new(raw("Monday", "Morning"), t).unwrap())
            .collect();

        let kept = drop_zero_listening_time(rows);
        let targets: Vec<f64> = kept.iter().map(|r| r.listening_time_minutes).collect();
        assert_eq!(targets, vec![12.5, 0.1, 45.0]);
    }
}
