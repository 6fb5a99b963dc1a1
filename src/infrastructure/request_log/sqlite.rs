//! SQLite request store implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::migrations::{Migrator, SqliteMigrator};
use crate::config::DatabaseConfig;
use crate::domain::record::RawRecord;
use crate::domain::request_log::{
    LiveObservation, NewRequest, PredictionEntry, RequestStore, SubmittedRequest,
};
use crate::domain::DomainError;

const REQUEST_COLUMNS: &str = "d.id AS id, d.Podcast_Name AS Podcast_Name, \
                               d.Episode_Length_minutes AS Episode_Length_minutes, \
                               d.Genre AS Genre, d.Publication_Day AS Publication_Day, \
                               d.Publication_Time AS Publication_Time, d.created_at AS created_at";

/// `data` and `predictions` tables in SQLite
#[derive(Debug, Clone)]
pub struct SqliteRequestStore {
    pool: SqlitePool,
}

impl SqliteRequestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to connect to '{}': {}", config.url, e))
            })?;

        Ok(Self::new(pool))
    }

    /// Creates or upgrades the tables
    pub async fn migrate(&self) -> Result<(), DomainError> {
        SqliteMigrator::new(self.pool.clone()).run().await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_request(row: &SqliteRow) -> Result<SubmittedRequest, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Malformed request row: {}", e));

    Ok(SubmittedRequest {
        id: row.try_get("id").map_err(read)?,
        podcast_name: row.try_get("Podcast_Name").map_err(read)?,
        episode_length_minutes: row.try_get("Episode_Length_minutes").map_err(read)?,
        genre: row.try_get("Genre").map_err(read)?,
        publication_day: row.try_get("Publication_Day").map_err(read)?,
        publication_time: row.try_get("Publication_Time").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

fn row_to_prediction(row: &SqliteRow) -> Result<PredictionEntry, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Malformed prediction row: {}", e));

    Ok(PredictionEntry {
        pred_id: row.try_get("pred_id").map_err(read)?,
        data_id: row.try_get("data_id").map_err(read)?,
        prediction: row.try_get("prediction").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
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

        let created_at = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to start transaction: {}", e)))?;

        let id = sqlx::query(
            r#"
            INSERT INTO data (Podcast_Name, Episode_Length_minutes, Genre,
                              Publication_Day, Publication_Time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.podcast_name)
        .bind(new.episode_length_minutes)
        .bind(&new.genre)
        .bind(&new.publication_day)
        .bind(&new.publication_time)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to store request: {}", e)))?
        .last_insert_rowid();

        let pred_id = sqlx::query(
            "INSERT INTO predictions (data_id, prediction, created_at) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(prediction)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to store prediction: {}", e)))?
        .last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit request: {}", e)))?;

        debug!(id, pred_id, prediction, "Stored request and prediction");

        Ok((
            SubmittedRequest {
                id,
                podcast_name: new.podcast_name,
                episode_length_minutes: new.episode_length_minutes,
                genre: new.genre,
                publication_day: new.publication_day,
                publication_time: new.publication_time,
                created_at,
            },
            PredictionEntry {
                pred_id,
                data_id: id,
                prediction,
                created_at,
            },
        ))
    }

    async fn list_requests(&self) -> Result<Vec<SubmittedRequest>, DomainError> {
        let rows = sqlx::query(&format!("SELECT {} FROM data d ORDER BY d.id", REQUEST_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list requests: {}", e)))?;

        rows.iter().map(row_to_request).collect()
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionEntry>, DomainError> {
        let rows = sqlx::query(
            "SELECT pred_id, data_id, prediction, created_at FROM predictions ORDER BY pred_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list predictions: {}", e)))?;

        rows.iter().map(row_to_prediction).collect()
    }

    async fn live_observations(&self) -> Result<Vec<LiveObservation>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, p.prediction AS prediction
            FROM predictions p
            INNER JOIN data d ON d.id = p.data_id
            ORDER BY p.pred_id
            "#,
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to join requests: {}", e)))?;

        rows.iter()
            .map(|row| {
                Ok(LiveObservation {
                    request: row_to_request(row)?,
                    prediction: row.try_get("prediction").map_err(|e| {
                        DomainError::storage(format!("Malformed prediction row: {}", e))
                    })?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    async fn store() -> SqliteRequestStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteRequestStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn record(name: &str, length: Option<f64>) -> RawRecord {
        RawRecord::builder()
            .podcast_name(name)
            .maybe_episode_length_minutes(length)
            .genre("Business")
            .publication_day("wednesday")
            .publication_time("Afternoon")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_record_and_join() {
        let store = store().await;

        let (request, entry) = store
            .record_prediction(&record("Market Watch", Some(35.0)), 21.5)
            .await
            .unwrap();
        store
            .record_prediction(&record("Money Talk", Some(80.0)), 55.0)
            .await
            .unwrap();

        assert_eq!(entry.data_id, request.id);
        assert_eq!(request.publication_day, "Wednesday");

        let requests = store.list_requests().await.unwrap();
        let predictions = store.list_predictions().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], request);
        assert_eq!(predictions[0], entry);

        let joined = store.live_observations().await.unwrap();
        assert_eq!(joined.len(), predictions.len());
        assert_eq!(joined[1].request.podcast_name, "Money Talk");
        assert_eq!(joined[1].prediction, 55.0);
    }

    #[tokio::test]
    async fn test_missing_length_stores_nothing() {
        let store = store().await;

        let err = store
            .record_prediction(&record("Show", None), 10.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.list_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_finite_prediction_rejected() {
        let store = store().await;

        let err = store
            .record_prediction(&record("Show", Some(10.0)), f64::NAN)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.list_predictions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphan_request_is_not_joined() {
        let store = store().await;
        store
            .record_prediction(&record("Show", Some(10.0)), 4.0)
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO data (Podcast_Name, Episode_Length_minutes, Genre, Publication_Day, Publication_Time, created_at) \
             VALUES ('Orphan', 1.0, 'News', 'Monday', 'Night', '2024-01-01T00:00:00Z')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        assert_eq!(store.list_requests().await.unwrap().len(), 2);
        assert_eq!(store.live_observations().await.unwrap().len(), 1);
    }
}
