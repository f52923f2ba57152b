/*!
 * Error Handling
 *
 * Defines application-wide error types and conversion implementations
 * for proper error handling and HTTP response mapping.
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error taxonomy (§7). Each variant maps to exactly one HTTP
/// status and one machine-readable error code.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or semantically invalid request body/query.
    Validation(String),
    /// Caller presented no principal, or principal headers were malformed.
    Unauthorized(String),
    /// Principal is known but not allowed to perform this action.
    Forbidden(String),
    /// Referenced entity (appointment, worker, service, ...) does not exist.
    NotFound(String),
    /// Option token is malformed, mis-signed, or expired.
    OptionInvalid(String),
    /// Requested status transition is not legal from the current status.
    InvalidState(String),
    /// Business rule blocks the action even though the request is well-formed
    /// (e.g. cancelling inside the cancel window without staff channel).
    PolicyDenied(String),
    /// A FREQUENT customer match was required but none was found.
    FrequentNotRegistered,
    /// Concurrent write lost a race (e.g. block slot taken between option
    /// generation and reservation).
    Conflict(String),
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Database error, always logged with detail and never echoed to the client.
    Database(sqlx::Error),
    /// Anything else.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::OptionInvalid(msg) => write!(f, "Option invalid: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state transition: {}", msg),
            Self::PolicyDenied(msg) => write!(f, "Policy denied: {}", msg),
            Self::FrequentNotRegistered => write!(f, "No matching frequent customer on record"),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            Self::Database(err) => write!(f, "Database error: {}", err),
            Self::Internal(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        Self::Database(err)
    }
}

impl From<crate::domain::TokenError> for AppError {
    fn from(err: crate::domain::TokenError) -> Self {
        Self::OptionInvalid(err.to_string())
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::OptionInvalid(msg) => (StatusCode::BAD_REQUEST, "OPTION_INVALID", msg),
            Self::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg),
            Self::PolicyDenied(msg) => (StatusCode::CONFLICT, "POLICY_DENIED", msg),
            Self::FrequentNotRegistered => (
                StatusCode::CONFLICT,
                "FREQUENT_NOT_REGISTERED",
                "No matching frequent customer on record".to_string(),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            Self::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "Too many requests, please try again later".to_string(),
            ),
            Self::Database(ref err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Unauthorized("Invalid credentials".to_string());
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");

        let err = AppError::NotFound("Appointment not found".to_string());
        assert_eq!(err.to_string(), "Not found: Appointment not found");
    }

    #[test]
    fn test_app_error_from_sqlx() {
        let sqlx_err = sqlx::Error::RowNotFound;
        let app_err: AppError = sqlx_err.into();
        match app_err {
            AppError::Database(_) => (),
            _ => panic!("Expected Database error"),
        }
    }

    #[test]
    fn test_app_error_from_token_error() {
        let app_err: AppError = crate::domain::TokenError::Expired.into();
        match app_err {
            AppError::OptionInvalid(_) => (),
            _ => panic!("Expected OptionInvalid error"),
        }
    }
}
