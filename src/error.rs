//! Problem+json error surface for the HTTP API.
//!
//! Every failure that leaves a handler is an [`ApiError`]: an HTTP status, a
//! stable SCREAMING_SNAKE code for programmatic callers, a human-readable
//! message, and optionally a per-field details payload. Responses render as
//! `application/problem+json` and carry a trace ID so a client-side report
//! can be matched to server logs.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::telemetry;

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, ToSchema, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// HTTP status for the response; not part of the serialized body.
    #[serde(skip)]
    pub status: StatusCode,
    /// Stable machine-readable code, e.g. `VALIDATION_FAILED`.
    pub code: Box<str>,
    /// Human-readable description of what went wrong.
    pub message: Box<str>,
    /// Per-field breakdown, present on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Seconds the client should wait before retrying, when known.
    pub retry_after: Option<u64>,
    /// Correlation ID tying this response to server-side log lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Build an error carrying the in-flight request's trace ID.
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: trace_id_for_response(),
        }
    }

    /// Attach a details payload, typically `{ field: reason }` pairs.
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Suggest a retry delay; also rendered as a `Retry-After` header.
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

/// Trace ID for the current task, falling back to a short generated
/// correlation ID so failures before the middleware ran stay matchable.
fn trace_id_for_response() -> Option<Box<str>> {
    let id = telemetry::current_trace_id()
        .unwrap_or_else(|| format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]));
    Some(id.into_boxed_str())
}

/// Whether a `DbErr` is a unique-constraint violation on any supported
/// backend. Postgres reports 23505; SQLite reports 1555 (primary key) or
/// 2067 (unique index).
pub(crate) fn is_unique_violation(error: &DbErr) -> bool {
    let sqlx_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => e,
        _ => return false,
    };
    let Some(db_err) = sqlx_err.as_database_error() else {
        return false;
    };
    db_err.is_unique_violation()
        || db_err
            .code()
            .is_some_and(|code| matches!(code.as_ref(), "23505" | "1555" | "2067"))
}

/// The fixed status/code taxonomy the API exposes.
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not Found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest => "VALIDATION_FAILED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let retry_after = self.retry_after;
        let mut response = (status, axum::Json(self)).into_response();
        response.headers_mut().insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );
        if let Some(seconds) = retry_after
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            response.headers_mut().insert("retry-after", value);
        }
        response
    }
}

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        Self::new(
            error_type.status_code(),
            error_type.error_code(),
            &error_type.to_string(),
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Repository failures arrive anyhow-wrapped around a DbErr; recover
        // the database mapping (conflict, unavailable) rather than a
        // blanket 500.
        let error = match error.downcast::<DbErr>() {
            Ok(db_err) => return db_err.into(),
            Err(other) => other,
        };
        tracing::error!("Internal error: {error:?}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<DbErr> for ApiError {
    fn from(error: DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            DbErr::RecordNotFound(what) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", what),
            ),
            DbErr::Conn(err) => {
                tracing::error!("Database connection error: {:?}", err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// 401 with the standard `UNAUTHORIZED` code.
pub fn unauthorized(message: Option<&str>) -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "UNAUTHORIZED",
        message.unwrap_or("Authentication required"),
    )
}

/// 401 carrying a trace ID captured before the task-local context existed.
pub fn unauthorized_with_trace_id(message: Option<&str>, trace_id: String) -> ApiError {
    ApiError {
        trace_id: Some(trace_id.into_boxed_str()),
        ..unauthorized(message)
    }
}

/// 404 for absent records, including foreign-owned ones.
pub fn not_found(message: Option<&str>) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        message.unwrap_or("Resource not found"),
    )
}

/// 400 with a per-field details payload.
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}
