//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;
use crate::infrastructure::services::Readiness;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unavailable,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ProbeStatus,
    pub version: &'static str,
}

/// One artifact inference depends on
#[derive(Debug, Serialize)]
pub struct ArtifactStatus {
    pub ready: bool,
    /// Path or model URI when ready, otherwise the reason it is not
    pub detail: String,
}

impl<T: ToString> From<&Result<T, String>> for ArtifactStatus {
    fn from(result: &Result<T, String>) -> Self {
        match result {
            Ok(found) => Self {
                ready: true,
                detail: found.to_string(),
            },
            Err(reason) => Self {
                ready: false,
                detail: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: ProbeStatus,
    pub version: &'static str,
    pub preprocessor: ArtifactStatus,
    pub model: ArtifactStatus,
    pub latency_ms: u64,
}

impl ReadyResponse {
    fn from_readiness(readiness: &Readiness, latency_ms: u64) -> Self {
        let status = if readiness.is_ready() {
            ProbeStatus::Healthy
        } else {
            ProbeStatus::Unavailable
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            preprocessor: (&readiness.preprocessor).into(),
            model: (&readiness.model).into(),
            latency_ms,
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: ProbeStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 503 until training has produced a transform and a run pointer
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let readiness = state.prediction_service.readiness().await;
    let response = ReadyResponse::from_readiness(&readiness, start.elapsed().as_millis() as u64);

    let status_code = match response.status {
        ProbeStatus::Healthy => StatusCode::OK,
        ProbeStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
