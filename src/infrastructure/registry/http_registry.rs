//! Remote model registry over HTTP

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::model::TrainedModel;
use crate::domain::registry::{validate_model_name, ModelRegistry, ModelUri, RegisteredModel};
use crate::domain::DomainError;

const GET_RETRIES: u32 = 1;
const RETRY_DELAY: Duration = Duration::from_millis(200);
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

#[derive(Serialize)]
struct RegisterRequest<'a> {
    run_id: &'a str,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct LatestVersionResponse {
    version: u32,
}

/// Registry service client
///
/// Routes: `POST /api/models/{name}/versions`,
/// `GET /api/models/{name}/versions/{version}` and
/// `GET /api/models/{name}/latest`. Each call has a timeout. GETs are retried
/// once on transport errors and 5xx responses; a register POST is sent once,
/// carrying the run id as its `Idempotency-Key`.
#[derive(Debug, Clone)]
pub struct HttpModelRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelRegistry {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DomainError::configuration(format!(
                "Registry base URL must be http(s), got '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/models/{}", self.base_url, path)
    }

    async fn send<F>(&self, retries: u32, build: F) -> Result<reqwest::Response, DomainError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut last_error = String::new();

        for attempt in 0..=retries {
            if attempt > 0 {
                warn!(attempt, error = %last_error, "Retrying registry request");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            match build(&self.client).send().await {
                Ok(response) if response.status().is_server_error() => {
                    last_error = format!("HTTP {}", response.status());
                }
                Ok(response) => return Ok(response),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(DomainError::registry(format!(
            "Registry request failed after {} attempt(s): {}",
            retries + 1,
            last_error
        )))
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DomainError::registry(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl ModelRegistry for HttpModelRegistry {
    async fn register(
        &self,
        name: &str,
        run_id: &str,
        model: &TrainedModel,
    ) -> Result<RegisteredModel, DomainError> {
        validate_model_name(name)?;
        let url = self.url(&format!("{}/versions", name));
        let body = RegisterRequest { run_id, model };

        let response = self
            .send(0, |client| {
                client
                    .post(&url)
                    .header(IDEMPOTENCY_KEY, run_id)
                    .json(&body)
            })
            .await?;
        let registered: RegisteredModel = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::registry(format!("Invalid register response: {}", e)))?;

        info!(uri = %registered.uri, run_id = %run_id, "Registered model");
        Ok(registered)
    }

    async fn load(&self, uri: &ModelUri) -> Result<TrainedModel, DomainError> {
        let url = self.url(&format!("{}/versions/{}", uri.name(), uri.version()));

        let response = self.send(GET_RETRIES, |client| client.get(&url)).await?;
        let bytes = Self::expect_success(response)
            .await?
            .bytes()
            .await
            .map_err(|e| DomainError::registry(format!("Failed to read '{}': {}", uri, e)))?;

        TrainedModel::from_bytes(&bytes)
    }

    async fn latest_version(&self, name: &str) -> Result<Option<u32>, DomainError> {
        validate_model_name(name)?;
        let url = self.url(&format!("{}/latest", name));

        let response = self.send(GET_RETRIES, |client| client.get(&url)).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let latest: LatestVersionResponse = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::registry(format!("Invalid latest response: {}", e)))?;
        Ok(Some(latest.version))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fs_registry::fixtures::trained_model;
    use super::*;
    use crate::domain::ErrorKind;
    use chrono::Utc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpModelRegistry {
        HttpModelRegistry::new(server.uri(), Duration::from_millis(500)).unwrap()
    }

    #[tokio::test]
    async fn test_register() {
        let server = MockServer::start().await;
        let registered = RegisteredModel {
            uri: ModelUri::new("podcast", 4).unwrap(),
            run_id: "run-1".to_string(),
            estimator: "bayesian_ridge".to_string(),
            created_at: Utc::now(),
        };
        Mock::given(method("POST"))
            .and(path("/api/models/podcast/versions"))
            .and(header("Idempotency-Key", "run-1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(&registered))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .register("podcast", "run-1", &trained_model())
            .await
            .unwrap();
        assert_eq!(result, registered);
    }

    #[tokio::test]
    async fn test_register_is_not_retried_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/models/podcast/versions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .register("podcast", "run-1", &trained_model())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[tokio::test]
    async fn test_load_retries_once_after_server_error() {
        let server = MockServer::start().await;
        let model = trained_model();
        Mock::given(method("GET"))
            .and(path("/api/models/podcast/versions/2"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/models/podcast/versions/2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(model.to_bytes().unwrap()))
            .mount(&server)
            .await;

        let loaded = client(&server)
            .load(&ModelUri::new("podcast", 2).unwrap())
            .await
            .unwrap();
        assert_eq!(loaded, model);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_registry_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server)
            .load(&ModelUri::new("podcast", 1).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
    }

    #[tokio::test]
    async fn test_latest_version() {
        let server = MockServer::start().await;
        Mock::given(path("/api/models/podcast/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"version": 7})))
            .mount(&server)
            .await;
        Mock::given(path("/api/models/unknown/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry = client(&server);
        assert_eq!(registry.latest_version("podcast").await.unwrap(), Some(7));
        assert_eq!(registry.latest_version("unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/api/models/podcast/versions/1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such version"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .load(&ModelUri::new("podcast", 1).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert!(err.message().contains("no such version"));
    }
}
