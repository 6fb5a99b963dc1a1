//! Request and error types shared by the handlers

pub mod error;
pub mod form;

pub use error::{ApiError, ApiErrorBody, ApiErrorType};
pub use form::Form;
