//! JSON error body returned by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, ErrorKind};

/// Error classes exposed to clients, one status each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequest,
    SchemaMismatch,
    ModelUnavailable,
    RegistryUnavailable,
    Internal,
}

impl ApiErrorType {
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::SchemaMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::RegistryUnavailable => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ApiErrorType {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => Self::InvalidRequest,
            ErrorKind::Schema => Self::SchemaMismatch,
            ErrorKind::ArtifactMissing | ErrorKind::ArtifactMismatch => Self::ModelUnavailable,
            ErrorKind::Registry => Self::RegistryUnavailable,
            ErrorKind::Configuration
            | ErrorKind::TrainingFailure
            | ErrorKind::Storage
            | ErrorKind::NotFound
            | ErrorKind::Internal => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorType,
    pub message: String,
    /// Form field the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn new(error: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status: error.status(),
            body: ApiErrorBody {
                error,
                message: message.into(),
                field: None,
                code: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorType::InvalidRequest, message)
    }

    /// Keep the class but answer with another status (e.g. 415 from the extractor)
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.body.field = Some(field.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.body.code = Some(code.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let api_err = Self::new(err.kind().into(), err.message());
        match err.kind() {
            ErrorKind::ArtifactMissing => api_err.with_code("model_not_trained"),
            ErrorKind::ArtifactMismatch => api_err.with_code("artifact_mismatch"),
            _ => api_err,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.body.message, self.status)
    }
}

impl std::error::Error for ApiError {}
