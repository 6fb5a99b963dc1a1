//! Record validation utilities

use thiserror::Error;

/// Maximum length for podcast names and genres
pub const MAX_LABEL_LENGTH: usize = 100;

/// Validation errors for raw records
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{0}' cannot be empty")]
    EmptyField(&'static str),

    #[error("Field '{0}' exceeds maximum length of {1} characters")]
    FieldTooLong(&'static str, usize),

    #[error("Episode length must be a finite, non-negative number of minutes, got {0}")]
    InvalidEpisodeLength(f64),

    #[error("Unknown publication day: '{0}'")]
    UnknownPublicationDay(String),

    #[error("Unknown publication time: '{0}'")]
    UnknownPublicationTime(String),

    #[error("Listening time must be a finite, non-negative number of minutes, got {0}")]
    InvalidListeningTime(f64),
}

/// Validate a free-text label such as a podcast name or genre
pub fn validate_label(field: &'static str, value: &str) -> Result<(), RecordValidationError> {
    if value.trim().is_empty() {
        return Err(RecordValidationError::EmptyField(field));
    }

    if value.chars().count() > MAX_LABEL_LENGTH {
        return Err(RecordValidationError::FieldTooLong(field, MAX_LABEL_LENGTH));
    }

    Ok(())
}

/// Validate an optional episode length
pub fn validate_episode_length(length: Option<f64>) -> Result<(), RecordValidationError> {
    match length {
        Some(value) if !value.is_finite() || value < 0.0 => {
            Err(RecordValidationError::InvalidEpisodeLength(value))
        }
        _ => Ok(()),
    }
}

/// Validate a listening time target
pub fn validate_listening_time(value: f64) -> Result<(), RecordValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RecordValidationError::InvalidListeningTime(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_label() {
        assert!(validate_label("Genre", "Comedy").is_ok());
        assert_eq!(
            validate_label("Genre", "   "),
            Err(RecordValidationError::EmptyField("Genre"))
        );
        assert!(matches!(
            validate_label("Genre", &"x".repeat(101)),
            Err(RecordValidationError::FieldTooLong("Genre", 100))
        ));
    }

    #[test]
    fn test_validate_episode_length() {
        assert!(validate_episode_length(None).is_ok());
        assert!(validate_episode_length(Some(0.0)).is_ok());
        assert!(validate_episode_length(Some(-1.0)).is_err());
        assert!(validate_episode_length(Some(f64::NAN)).is_err());
        assert!(validate_episode_length(Some(f64::INFINITY)).is_err());
    }
}
