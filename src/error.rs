use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    models::MessageResponse,
    repository::RepositoryError,
    resource::missing_fields_message,
};

/// ApiError
///
/// Every failure a handler can report. Rendered as a `{message}` body with a status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{}", missing_fields_message(.0))]
    Validation(Vec<&'static str>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("upload failed: {0}")]
    Storage(String),
    #[error("stored document is malformed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Repository(RepositoryError::NotAnObject) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Malformed(_) | ApiError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // Store and storage details stay in the logs.
            tracing::error!("request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}
