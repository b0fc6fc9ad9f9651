//! Reservation endpoints.
//!
//! - `GET /api/reservations` - list by slot, customer, venue or everything
//! - `GET /api/reservations/:id` - one reservation
//! - `POST /api/reservations` - book a slot
//! - `PUT /api/reservations` - move a reservation through its lifecycle

use crate::error::AppError;
use crate::extractors::{ApiJson, ApiQuery, Authenticated, MaybeAuthenticated};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use fieldbook_core::types::parse_date;
use fieldbook_core::{
    CreateReservation, Reservation, ReservationFilter, ReservationId, ReservationStatus, UserId,
    VenueId,
};
use serde::Deserialize;

/// Query string of `GET /api/reservations`.
///
/// Precedence: `date` + `venue_id`, then `user_id`, then `venue_id`, then `all`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Slot date (requires `venue_id`).
    pub date: Option<String>,
    /// Venue filter.
    pub venue_id: Option<String>,
    /// Customer filter.
    pub user_id: Option<String>,
    /// List everything.
    #[serde(default)]
    pub all: bool,
}

impl ListQuery {
    fn into_filter(self) -> Result<ReservationFilter, AppError> {
        let venue_id = self
            .venue_id
            .as_deref()
            .map(str::parse::<VenueId>)
            .transpose()?;

        match (self.date, venue_id, self.user_id) {
            (Some(date), Some(venue_id), _) => Ok(ReservationFilter::Slot {
                venue_id,
                date: parse_date(&date)?,
            }),
            (Some(_), None, _) => Err(AppError::validation("date requires venue_id")),
            (None, _, Some(user_id)) => Ok(ReservationFilter::User(UserId(user_id))),
            (None, Some(venue_id), None) => Ok(ReservationFilter::Venue(venue_id)),
            (None, None, None) if self.all => Ok(ReservationFilter::All),
            (None, None, None) => Err(AppError::validation(
                "specify date and venue_id, user_id, venue_id, or all=true",
            )),
        }
    }
}

/// Body of `PUT /api/reservations`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusChange {
    /// Reservation id.
    pub id: String,
    /// Target status.
    pub status: String,
}

/// List reservations ordered by date and time.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/reservations?venue_id=...&date=2026-02-28"
/// ```
///
/// # Errors
///
/// 422 for an incomplete or malformed filter, 503 when the store fails.
pub async fn list_reservations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(state.ledger.list(filter).await?))
}

/// Fetch one reservation.
///
/// # Errors
///
/// 422 for a malformed id, 404 when it does not exist.
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let id: ReservationId = id.parse()?;
    Ok(Json(state.ledger.get(id).await?))
}

/// Book a slot.
///
/// Public. A signed-in caller's account id is attached to the reservation.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reservations \
///   -H "Content-Type: application/json" \
///   -d '{"venue_id":"...","customer_name":"Ada","customer_surname":"Yilmaz",
///        "phone":"5550000000","date":"2026-02-28","time":"21:00"}'
/// ```
///
/// # Errors
///
/// - 422 for missing or malformed fields
/// - 404 for an unknown venue
/// - 409 `SLOT_TAKEN` when the slot is held or blocked
pub async fn create_reservation(
    State(state): State<AppState>,
    MaybeAuthenticated(actor): MaybeAuthenticated,
    ApiJson(mut request): ApiJson<CreateReservation>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    if let Some(actor) = actor {
        request.user_id = Some(actor.user_id);
    }

    let reservation = state.ledger.create(request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Change a reservation's status. Administrators and venue owners only.
///
/// # Errors
///
/// - 401 without a valid token, 403 for customers
/// - 404 for an unknown reservation
/// - 409 `INVALID_TRANSITION` for a change outside the lifecycle
pub async fn update_status(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<Reservation>, AppError> {
    if !actor.can_manage_reservations() {
        tracing::warn!(user_id = %actor.user_id, role = ?actor.role, "Status change refused");
        return Err(AppError::forbidden("only administrators and owners may change status"));
    }

    let id: ReservationId = change.id.trim().parse()?;
    let status: ReservationStatus = change.status.trim().parse()?;

    let reservation = state.ledger.set_status(id, status).await?;
    Ok(Json(reservation))
}
