//! Record domain module
//!
//! Typed episode records validated at the ingestion and submission boundaries.

mod entity;
mod validation;

pub use entity::{
    EngineeredRecord, LabeledRecord, PublicationDay, PublicationTime, RawRecord, RawRecordBuilder,
};
pub use validation::{RecordValidationError, MAX_LABEL_LENGTH};

use crate::domain::DomainError;

impl From<RecordValidationError> for DomainError {
    fn from(err: RecordValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}
