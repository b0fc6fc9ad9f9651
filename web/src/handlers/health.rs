//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode};

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check: the settings store must answer.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
///
/// # Errors
///
/// 503 when the backing store is unreachable.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, &'static str), AppError> {
    state.settings.get().await?;
    Ok((StatusCode::OK, "ready"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
