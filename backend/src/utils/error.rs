use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::sql_advisor::{AdvisorError, ErrorKind, MultiError};

/// API Error returned by the HTTP handlers
///
/// Each variant carries the context needed to build the JSON error body.
#[derive(Error, Debug)]
pub enum ApiError {
    // Validation errors 4xxx
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid SQL: {0}")]
    InvalidSQL(String),

    // Advisor errors 6xxx
    /// Advise ran but collected errors; partial advice travels in `details`
    #[error("{errors}")]
    AdviceFailed { advice: String, errors: MultiError },

    // System errors 5xxx - auto-convert from sqlx::Error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Helper to create validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Helper to create invalid SQL error
    pub fn invalid_sql(message: impl Into<String>) -> Self {
        Self::InvalidSQL(message.into())
    }

    pub fn advice_failed(advice: String, errors: MultiError) -> Self {
        Self::AdviceFailed { advice, errors }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            // Validation errors 4xxx
            Self::ValidationError(_) => 4001,
            Self::InvalidSQL(_) => 4002,

            // System errors 5xxx
            Self::Database(_) => 5002,

            // Advisor errors 6xxx
            Self::AdviceFailed { errors, .. } => advice_failed_code(errors),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::AdviceFailed { advice, errors } => Some(serde_json::json!({
                "advice": advice,
                "errors": errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }
}

// The most severe collected error decides the code
fn advice_failed_code(errors: &MultiError) -> i32 {
    if errors.has_kind(ErrorKind::Resolution) {
        6003
    } else if errors.has_kind(ErrorKind::Execution) {
        6001
    } else if errors.has_kind(ErrorKind::Persistence) {
        6004
    } else {
        6005
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let message = self.to_string();
        let details = self.details();

        let status = match code {
            4001..=4999 => StatusCode::BAD_REQUEST,
            6003 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = ApiErrorResponse { code, message, details };

        (status, Json(response)).into_response()
    }
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::EmptySql => Self::validation_error("sql_text cannot be empty"),
            AdvisorError::InvalidSql(msg) => Self::invalid_sql(msg),
            AdvisorError::Persistence(e) => Self::Database(e),
            // resolution and execution failures only surface through an advise run
            other => Self::advice_failed(String::new(), other.into()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::validation_error(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
