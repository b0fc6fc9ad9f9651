//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{availability, health, reservations, settings};
use crate::state::AppState;
use axum::{
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `GET /health`, `GET /ready`
/// - `GET|POST|PUT /api/reservations`, `GET /api/reservations/:id`
/// - `GET /api/venues/:id/slots`
/// - `GET|PUT /api/settings`
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/reservations",
            get(reservations::list_reservations)
                .post(reservations::create_reservation)
                .put(reservations::update_status),
        )
        .route("/reservations/:id", get(reservations::get_reservation))
        .route("/venues/:id/slots", get(availability::open_slots))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
