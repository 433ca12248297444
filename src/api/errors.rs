use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db;
use crate::services::exam_access::ExamAccessError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    /// Every offending field with its messages.
    Validation(BTreeMap<String, Vec<String>>),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    /// Duplicate of a unique entity. Rendered as 400.
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant
    /// carrying both.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(format!("{context}: {err}"))
    }

    /// Unique violations become `Conflict(conflict)`; anything else is internal.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str, context: &str) -> Self {
        match db::unique_violation(&err) {
            Some(constraint) => {
                tracing::info!(constraint = %constraint, "Rejected duplicate write");
                Self::Conflict(conflict.to_string())
            }
            None => Self::internal(err, context),
        }
    }

    /// Validation failure for a single field.
    pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        flatten_validation_errors(&errors, "", &mut fields);
        Self::Validation(fields)
    }
}

impl From<ExamAccessError> for ApiError {
    fn from(error: ExamAccessError) -> Self {
        Self::Forbidden(match error {
            ExamAccessError::NotRegistered => "You are not registered for this exam",
            ExamAccessError::NotStarted => "Exam has not started yet",
            ExamAccessError::Ended => "Exam has ended",
        })
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(error) => {
                let message = error.body_text();
                let field = deserialize_error_field(&message).unwrap_or_else(|| "body".to_string());
                Self::invalid_field(&field, message)
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}

/// Recovers the offending field path from a serde error message, e.g.
/// ``missing field `score` `` or `grades[1].score: invalid type: ...`.
pub(crate) fn deserialize_error_field(message: &str) -> Option<String> {
    let message = message.rsplit_once("target type: ").map_or(message, |(_, rest)| rest);

    let (path, rest) = match message.split_once(": ") {
        Some((path, rest)) if !path.is_empty() && !path.contains(' ') => (Some(path), rest),
        _ => (None, message),
    };

    let missing = rest
        .strip_prefix("missing field `")
        .and_then(|tail| tail.split_once('`'))
        .map(|(field, _)| field);

    match (path, missing) {
        (Some(path), Some(field)) => Some(format!("{path}.{field}")),
        (None, Some(field)) => Some(field.to_string()),
        (Some(path), None) => Some(path.to_string()),
        (None, None) => None,
    }
}

/// Flattens nested validation errors into `path -> messages`, using dotted
/// paths for nested structs and `[index]` for list items.
pub(crate) fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{prefix}.{field}") };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(path).or_default();
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, &path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, errors: None }))
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                let status = StatusCode::BAD_REQUEST;
                let detail = format!(
                    "Validation failed for: {}",
                    errors.keys().cloned().collect::<Vec<_>>().join(", ")
                );
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail, errors: Some(errors) }),
                )
                    .into_response()
            }
            ApiError::Unauthorized(message) => {
                let mut response = error_response(StatusCode::UNAUTHORIZED, message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                error_response(StatusCode::FORBIDDEN, message.to_string())
            }
            ApiError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => error_response(StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => error_response(StatusCode::BAD_REQUEST, message),
            ApiError::TooManyRequests(message) => {
                error_response(StatusCode::TOO_MANY_REQUESTS, message.to_string())
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}
