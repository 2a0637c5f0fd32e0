use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{error::ApiError, models::UpdateUserRequest};

/// FieldError
///
/// One entry of the `details` array in a `Validation Failed` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// UserIdParams
///
/// Raw path parameters of the `/{id}` routes. The id is kept as a string so that
/// a malformed value reaches the handler and is reported with field details instead
/// of being rejected by the `Path` extractor. Handlers take it directly as an extractor.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct UserIdParams {
    /// Positive integer user id.
    #[validate(custom(function = "validate_user_id"))]
    pub id: String,
}

impl UserIdParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Validates the parameter and returns the numeric id.
    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.validate()?;
        parse_id(&self.id).map_err(|err| ApiError::Validation(vec![field_error("id", &err)]))
    }
}

/// A segment that `Path` cannot decode at all (e.g. invalid UTF-8 after percent-decoding)
/// is reported the same way as a non-numeric id.
impl<S> FromRequestParts<S> for UserIdParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<Self>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected undecodable id segment");
                ApiError::Validation(vec![FieldError::new("id", INVALID_ID_MESSAGE)])
            })?;
        Ok(params)
    }
}

const INVALID_ID_MESSAGE: &str = "ID must be a valid number";

fn parse_id(raw: &str) -> Result<i64, ValidationError> {
    let id = raw.trim().parse::<i64>().map_err(|_| {
        let mut err = ValidationError::new("invalid_type");
        err.message = Some(INVALID_ID_MESSAGE.into());
        err
    })?;

    if id <= 0 {
        let mut err = ValidationError::new("range");
        err.message = Some("ID must be a positive integer".into());
        return Err(err);
    }

    Ok(id)
}

fn validate_user_id(raw: &str) -> Result<(), ValidationError> {
    parse_id(raw).map(|_| ())
}

/// Schema-level rule for `UpdateUserRequest`: an update must change something.
pub(crate) fn validate_update_not_empty(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    if req.name.is_none() && req.email.is_none() && req.role.is_none() {
        let mut err = ValidationError::new("empty_update");
        err.message = Some("At least one field must be provided for update".into());
        return Err(err);
    }
    Ok(())
}

/// parse_update_body
///
/// Decodes and validates the raw update body. An empty body is read as `{}` and
/// therefore fails the at-least-one-field rule rather than the JSON decoder.
pub fn parse_update_body(body: &[u8]) -> Result<UpdateUserRequest, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    let request = serde_json::from_slice::<UpdateUserRequest>(body)
        .map_err(|e| ApiError::Validation(vec![FieldError::new("body", e.to_string())]))?
        .normalized();

    request.validate()?;
    Ok(request)
}

fn field_error(field: &str, err: &ValidationError) -> FieldError {
    let message = err
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("Invalid value ({})", err.code));
    FieldError::new(field, message)
}

/// Flattens `validator` output into field/message pairs, ordered by field name.
/// Struct-level failures (reported under `__all__`) are attributed to `body`.
pub fn format_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = if field == "__all__" {
                "body".to_string()
            } else {
                field.to_string()
            };
            errs.iter()
                .map(|err| field_error(&field, err))
                .collect::<Vec<_>>()
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}
