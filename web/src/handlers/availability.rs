//! Open-slot queries.
//!
//! - `GET /api/venues/:id/slots?date=YYYY-MM-DD`

use crate::error::AppError;
use crate::extractors::ApiQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use fieldbook_core::types::parse_date;
use fieldbook_core::{TimeSlot, VenueId};
use serde::{Deserialize, Serialize};

/// Query string of the slots endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlotsQuery {
    /// Date to resolve, `YYYY-MM-DD`.
    pub date: String,
}

/// Open slots of one venue on one date.
#[derive(Debug, Serialize)]
pub struct OpenSlotsResponse {
    /// Venue.
    pub venue_id: VenueId,
    /// Date.
    pub date: NaiveDate,
    /// Bookable time labels, in the venue's display order.
    pub slots: Vec<TimeSlot>,
}

/// List the slots that can still be booked.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:8080/api/venues/550e8400-e29b-41d4-a716-446655440000/slots?date=2026-02-28"
/// ```
///
/// Response:
/// ```json
/// {
///   "venue_id": "550e8400-e29b-41d4-a716-446655440000",
///   "date": "2026-02-28",
///   "slots": ["17:00", "18:00", "22:00", "23:00", "00:00"]
/// }
/// ```
///
/// # Errors
///
/// 422 for a malformed id or date, 404 for an unknown venue.
pub async fn open_slots(
    State(state): State<AppState>,
    Path(venue_id): Path<String>,
    ApiQuery(query): ApiQuery<SlotsQuery>,
) -> Result<Json<OpenSlotsResponse>, AppError> {
    let venue_id: VenueId = venue_id.parse()?;
    let date = parse_date(&query.date)?;

    let open = state.availability.open_slots(venue_id, date).await?;

    Ok(Json(OpenSlotsResponse {
        venue_id: open.venue_id(),
        date: open.date(),
        slots: open.to_vec(),
    }))
}
