//! In-memory request store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::record::RawRecord;
use crate::domain::request_log::{
    LiveObservation, NewRequest, PredictionEntry, RequestStore, SubmittedRequest,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    data: Vec<SubmittedRequest>,
    predictions: Vec<PredictionEntry>,
}

/// In-memory implementation of RequestStore
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    tables: RwLock<Tables>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn record_prediction(
        &self,
        record: &RawRecord,
        prediction: f64,
    ) -> Result<(SubmittedRequest, PredictionEntry), DomainError> {
        let new = NewRequest::from_record(record)?;
        if !prediction.is_finite() {
            return Err(DomainError::validation(format!(
                "Refusing to store non-finite prediction {}",
                prediction
            )));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| DomainError::internal("Failed to acquire write lock"))?;

        let created_at = Utc::now();
        let request = SubmittedRequest {
            id: tables.data.len() as i64 + 1,
            podcast_name: new.podcast_name,
            episode_length_minutes: new.episode_length_minutes,
            genre: new.genre,
            publication_day: new.publication_day,
            publication_time: new.publication_time,
            created_at,
        };
        let entry = PredictionEntry {
            pred_id: tables.predictions.len() as i64 + 1,
            data_id: request.id,
            prediction,
            created_at,
        };

        tables.data.push(request.clone());
        tables.predictions.push(entry.clone());
        Ok((request, entry))
    }

    async fn list_requests(&self) -> Result<Vec<SubmittedRequest>, DomainError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire read lock"))?;
        Ok(tables.data.clone())
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionEntry>, DomainError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire read lock"))?;
        Ok(tables.predictions.clone())
    }

    async fn live_observations(&self) -> Result<Vec<LiveObservation>, DomainError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire read lock"))?;

        let by_id: HashMap<i64, &SubmittedRequest> =
            tables.data.iter().map(|r| (r.id, r)).collect();

        Ok(tables
            .predictions
            .iter()
            .filter_map(|p| {
                by_id.get(&p.data_id).map(|request| LiveObservation {
                    request: (*request).clone(),
                    prediction: p.prediction,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    fn record(length: Option<f64>) -> RawRecord {
        RawRecord::builder()
            .podcast_name("Sports Central")
            .maybe_episode_length_minutes(length)
            .genre("Sports")
            .publication_day("Sunday")
            .publication_time("Morning")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_ids_and_join() {
        let store = InMemoryRequestStore::new();
        let (first, _) = store.record_prediction(&record(Some(20.0)), 9.0).await.unwrap();
        let (second, entry) = store.record_prediction(&record(Some(40.0)), 18.0).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(entry.pred_id, 2);
        assert_eq!(entry.data_id, 2);

        let joined = store.live_observations().await.unwrap();
        assert_eq!(joined.len(), 2);
        assert_eq!(joined[0].request, first);
        assert_eq!(joined[1].prediction, 18.0);
    }

    #[tokio::test]
    async fn test_rejected_records_leave_tables_untouched() {
        let store = InMemoryRequestStore::new();

        let err = store.record_prediction(&record(None), 1.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = store
            .record_prediction(&record(Some(1.0)), f64::INFINITY)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(store.list_requests().await.unwrap().is_empty());
        assert!(store.list_predictions().await.unwrap().is_empty());
    }
}
