//! HTTP-level errors and their status codes

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::application::ApplicationError;

/// Errors returned by the upload endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Application(ApplicationError::Domain(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Application(ApplicationError::UnsupportedWorkbook { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Application(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("upload failed: {}", self);
        } else {
            warn!("upload rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
