//! Request-boundary error translation.
//!
//! Every `ServiceError` becomes a status code plus `{"error": "..."}`.
//! Internal failures are logged and answered with a generic message.

use assocdb_core::ServiceError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        let details = details.into();
        error!("event=request_failed module=http status=error error_code=internal error={details}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        let status = match &value {
            ServiceError::InvalidArgument(_) | ServiceError::Conflict { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::NotFound { .. } | ServiceError::NotAssociated { .. } => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Repo(_) | ServiceError::InconsistentState(_) => {
                return Self::internal(value.to_string());
            }
        };
        Self {
            status,
            message: value.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", value.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        Self::bad_request(format!("invalid path: {}", value.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
