//! Raw dataset download and parsing

use std::io::ErrorKind as IoErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::row::parse_labeled;
use crate::domain::dataset::DatasetSource;
use crate::domain::record::LabeledRecord;
use crate::domain::DomainError;

/// Fetches a labelled CSV from an http(s) URL or a local path
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    client: reqwest::Client,
}

impl CsvDatasetSource {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DomainError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Request to '{}' failed: {}", url, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DomainError::artifact_missing(format!(
                "Dataset '{}' not found",
                url
            )));
        }
        if !status.is_success() {
            return Err(DomainError::storage(format!(
                "Dataset download '{}' returned HTTP {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read '{}': {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn read_local(path: &str) -> Result<Vec<u8>, DomainError> {
        tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == IoErrorKind::NotFound {
                DomainError::artifact_missing(format!("Dataset '{}' not found", path))
            } else {
                DomainError::storage(format!("Failed to read '{}': {}", path, e))
            }
        })
    }
}

#[async_trait]
impl DatasetSource for CsvDatasetSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<LabeledRecord>, DomainError> {
        let bytes = if uri.starts_with("http://") || uri.starts_with("https://") {
            self.download(uri).await?
        } else {
            Self::read_local(uri.strip_prefix("file://").unwrap_or(uri)).await?
        };

        let records = parse_labeled(&bytes)?;
        info!(uri = %uri, rows = records.len(), "Fetched dataset");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CSV: &str = "\
Podcast_Name,Episode_Length_minutes,Genre,Publication_Day,Publication_Time,Number_of_Ads,Listening_Time_minutes
Tech Talks,60.5,Technology,Monday,Morning,1,40.2
Daily Digest,,News,Friday,Evening,0,12.0
";

    fn source() -> CsvDatasetSource {
        CsvDatasetSource::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("raw.csv");
        std::fs::write(&file, CSV).unwrap();

        let records = source().fetch(file.to_str().unwrap()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record.episode_length_minutes, None);

        let uri = format!("file://{}", file.display());
        assert_eq!(source().fetch(&uri).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = source().fetch("/nonexistent/raw.csv").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/raw.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
            .mount(&server)
            .await;

        let records = source()
            .fetch(&format!("{}/data/raw.csv", server.uri()))
            .await
            .unwrap();
        assert_eq!(records[0].record.podcast_name, "Tech Talks");
    }

    #[tokio::test]
    async fn test_http_errors() {
        let server = MockServer::start().await;
        Mock::given(path("/gone.csv"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/broken.csv"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let missing = source()
            .fetch(&format!("{}/gone.csv", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::ArtifactMissing);

        let broken = source()
            .fetch(&format!("{}/broken.csv", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(broken.kind(), ErrorKind::Storage);
    }
}
