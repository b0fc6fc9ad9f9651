//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP responses. Every engine
//! error maps to exactly one status code:
//!
//! | Engine error | Status | Code |
//! |---|---|---|
//! | `Validation` | 422 | `VALIDATION_ERROR` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `Conflict` | 409 | `SLOT_TAKEN` |
//! | `InvalidTransition` | 409 | `INVALID_TRANSITION` |
//! | `Authorization` | 403 | `FORBIDDEN` |
//! | `Unavailable` | 503 | `SERVICE_UNAVAILABLE` |
//!
//! Missing or invalid credentials never reach the engine; the extractors
//! reject them with 401 `UNAUTHORIZED`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fieldbook_core::{BookingError, ConflictReason};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Reservation>, AppError> {
///     let reservation = state.ledger.get(id).await?;
///     Ok(Json(reservation))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code.to_string())
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(message) => Self::validation(message),
            BookingError::NotFound { resource, id } => Self::not_found(resource, id),
            BookingError::Conflict {
                date, time, reason, ..
            } => match reason {
                ConflictReason::SlotHeld => {
                    Self::conflict("SLOT_TAKEN", format!("{date} {time} is already reserved"))
                }
                ConflictReason::SlotBlocked => {
                    Self::conflict("SLOT_TAKEN", format!("{date} {time} is not available"))
                }
            },
            BookingError::InvalidTransition { .. } => {
                Self::conflict("INVALID_TRANSITION", err.to_string())
            }
            BookingError::Authorization(message) => Self::forbidden(message),
            BookingError::Unavailable(_) => {
                Self::unavailable("Service temporarily unavailable, please retry")
                    .with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fieldbook_core::{ReservationStatus, TimeSlot, VenueId};

    #[test]
    fn test_error_display() {
        let err = AppError::validation("phone is required");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] phone is required");
    }

    #[test]
    fn test_not_found() {
        let err: AppError = BookingError::reservation_not_found("123").into();
        assert_eq!(err.to_string(), "[NOT_FOUND] reservation with id 123 not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_is_slot_taken() {
        let err: AppError = BookingError::Conflict {
            venue_id: VenueId::new(),
            date: chrono::NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            time: TimeSlot::new(21, 0).unwrap(),
            reason: ConflictReason::SlotHeld,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "SLOT_TAKEN");
        assert!(err.message.contains("21:00"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BookingError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                BookingError::InvalidTransition {
                    from: ReservationStatus::Pending,
                    to: ReservationStatus::Completed,
                },
                StatusCode::CONFLICT,
            ),
            (BookingError::Authorization("no".into()), StatusCode::FORBIDDEN),
            (BookingError::unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).status, status);
        }
    }

    #[test]
    fn test_unavailable_hides_details() {
        let err = AppError::from(BookingError::unavailable("connection refused on 10.0.0.7"));
        assert!(!err.message.contains("10.0.0.7"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
