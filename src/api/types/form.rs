//! URL-encoded form extractor that rejects in the API error format

use axum::{
    extract::{rejection::FormRejection, FromRequest, Request},
    Form as AxumForm,
};
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiErrorType};

/// Wrapper around `axum::Form` whose rejections are [`ApiError`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct Form<T>(pub T);

impl<T> Form<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<S, T> FromRequest<S> for Form<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumForm::<T>::from_request(req, state).await {
            Ok(AxumForm(value)) => Ok(Form(value)),
            Err(rejection) => Err(ApiError::new(
                ApiErrorType::InvalidRequest,
                format_rejection_message(&rejection),
            )
            .with_status(rejection.status())
            .with_code("form_parse_error")),
        }
    }
}

fn format_rejection_message(rejection: &FormRejection) -> String {
    match rejection {
        FormRejection::InvalidFormContentType(_) => {
            "Missing Content-Type header. Expected 'application/x-www-form-urlencoded'.".to_string()
        }
        FormRejection::FailedToDeserializeForm(err) => {
            format!("Invalid form data: {}", err.body_text())
        }
        FormRejection::FailedToDeserializeFormBody(err) => {
            format!("Invalid form data: {}", err.body_text())
        }
        FormRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid form request".to_string(),
    }
}
