use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::validation::{FieldError, format_validation_errors};

/// ServiceError
///
/// Failure kinds reported by a `UserRepository`. Not-found is its own variant so callers
/// can branch on it structurally.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found")]
    NotFound,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// ApiError
///
/// Every non-success outcome of a users endpoint. Validation and authorization
/// failures are answered directly; `Internal` is the generic channel for anything
/// the handlers did not anticipate.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation Failed")]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("User not found")]
    NotFound,

    #[error(transparent)]
    Internal(ServiceError),
}

/// ValidationErrorBody
///
/// `{ "error": "Validation Failed", "details": [...] }`
#[derive(Debug, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ValidationErrorBody {
    pub error: String,
    pub details: Vec<FieldError>,
}

/// ErrorBody
///
/// Shared shape of the auth, not-found and internal error responses. `message` is
/// omitted when there is nothing to add to `error`.
#[derive(Debug, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    fn new(error: &str, message: Option<&str>) -> Json<Self> {
        Json(Self {
            error: error.to_string(),
            message: message.map(str::to_string),
        })
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound => Self::NotFound,
            other => Self::Internal(other),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(format_validation_errors(&errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(details) => (
                status,
                Json(ValidationErrorBody {
                    error: "Validation Failed".to_string(),
                    details,
                }),
            )
                .into_response(),
            Self::Unauthorized(message) => {
                (status, ErrorBody::new("Unauthorized", Some(message))).into_response()
            }
            Self::Forbidden(message) => {
                (status, ErrorBody::new("Forbidden", Some(message))).into_response()
            }
            Self::NotFound => (status, ErrorBody::new("User not found", None)).into_response(),
            Self::Internal(err) => {
                tracing::error!(error = %error_chain(&err), "Unhandled error while serving request");
                (status, ErrorBody::new("Internal Server Error", None)).into_response()
            }
        }
    }
}

/// error_chain
///
/// Renders an error followed by its `source()` chain as `outer: inner: root`, so the
/// log line keeps the full cause trail.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Result type alias for the users endpoints.
pub type ApiResult<T> = Result<T, ApiError>;
