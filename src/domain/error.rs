use thiserror::Error;

/// Structured error kind, used by callers that need to branch on the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Schema,
    Configuration,
    ArtifactMissing,
    ArtifactMismatch,
    Registry,
    TrainingFailure,
    Storage,
    NotFound,
    Internal,
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Artifact missing: {message}")]
    ArtifactMissing { message: String },

    #[error("Artifact mismatch: {message}")]
    ArtifactMismatch { message: String },

    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("Training failure: {message}")]
    TrainingFailure { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn artifact_missing(message: impl Into<String>) -> Self {
        Self::ArtifactMissing {
            message: message.into(),
        }
    }

    pub fn artifact_mismatch(message: impl Into<String>) -> Self {
        Self::ArtifactMismatch {
            message: message.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    pub fn training(message: impl Into<String>) -> Self {
        Self::TrainingFailure {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the structured kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::ArtifactMissing { .. } => ErrorKind::ArtifactMissing,
            Self::ArtifactMismatch { .. } => ErrorKind::ArtifactMismatch,
            Self::Registry { .. } => ErrorKind::Registry,
            Self::TrainingFailure { .. } => ErrorKind::TrainingFailure,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns the message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Schema { message }
            | Self::Configuration { message }
            | Self::ArtifactMissing { message }
            | Self::ArtifactMismatch { message }
            | Self::Registry { message }
            | Self::TrainingFailure { message }
            | Self::Storage { message }
            | Self::NotFound { message }
            | Self::Internal { message } => message,
        }
    }

    /// Prefixes the message with the originating operation, keeping the kind
    pub fn with_context(self, operation: &str) -> Self {
        let wrap = |message: String| format!("{}: {}", operation, message);

        match self {
            Self::Validation { message } => Self::Validation { message: wrap(message) },
            Self::Schema { message } => Self::Schema { message: wrap(message) },
            Self::Configuration { message } => Self::Configuration { message: wrap(message) },
            Self::ArtifactMissing { message } => Self::ArtifactMissing { message: wrap(message) },
            Self::ArtifactMismatch { message } => Self::ArtifactMismatch { message: wrap(message) },
            Self::Registry { message } => Self::Registry { message: wrap(message) },
            Self::TrainingFailure { message } => Self::TrainingFailure { message: wrap(message) },
            Self::Storage { message } => Self::Storage { message: wrap(message) },
            Self::NotFound { message } => Self::NotFound { message: wrap(message) },
            Self::Internal { message } => Self::Internal { message: wrap(message) },
        }
    }
}
