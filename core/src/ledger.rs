//! Reservation Ledger.
//!
//! Owns the invariant *at most one active reservation per `(venue, date, time)`*.
//!
//! # Create
//!
//! 1. Validate the request (required fields, id/date/time formats)
//! 2. Resolve the venue
//! 3. Check the slot belongs to the venue's catalog and is not blocked
//! 4. Stamp the price
//! 5. Atomically insert, or fail with a conflict
//!
//! The invariant rests entirely on step 5 being a single atomic store
//! operation. Steps 2-3 read state that may change concurrently; that is
//! acceptable because they only ever *reject* requests.
//!
//! # Status transitions
//!
//! Validated against [`ReservationStatus::can_transition_to`] and written with
//! compare-and-set, so two concurrent administrators cannot drive a
//! reservation through a transition that is not in the table.

use crate::availability::effective_catalog;
use crate::environment::Clock;
use crate::error::{BookingError, ConflictReason, Result};
use crate::pricing;
use crate::repository::{ReservationFilter, ReservationRepository, VenueCatalog};
use crate::settings::SettingsStore;
use crate::types::{
    parse_date, CreateReservation, Reservation, ReservationId, ReservationStatus, TimeSlot,
    VenueId,
};
use std::sync::Arc;

/// How many times a status change re-reads after losing a compare-and-set race.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Engine component owning reservation creation and lifecycle.
#[derive(Clone)]
pub struct ReservationLedger {
    reservations: Arc<dyn ReservationRepository>,
    venues: Arc<dyn VenueCatalog>,
    settings: SettingsStore,
    clock: Arc<dyn Clock>,
}

/// A create request after field validation.
struct ValidRequest {
    venue_id: VenueId,
    customer_name: String,
    customer_surname: String,
    phone: String,
    date: chrono::NaiveDate,
    time: TimeSlot,
}

impl ReservationLedger {
    /// Create the ledger.
    #[must_use]
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        venues: Arc<dyn VenueCatalog>,
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reservations,
            venues,
            settings,
            clock,
        }
    }

    /// List reservations, ordered by `(date, time)` ascending.
    ///
    /// [`ReservationFilter::Slot`] yields active reservations only; the other
    /// filters return every status.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unavailable`] if the store fails.
    pub async fn list(&self, filter: ReservationFilter) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.list(filter.clone()).await?;
        tracing::debug!(filter = ?filter, count = reservations.len(), "Listed reservations");
        Ok(reservations)
    }

    /// Load one reservation.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if no reservation has this id
    /// - [`BookingError::Unavailable`] if the store fails
    pub async fn get(&self, id: ReservationId) -> Result<Reservation> {
        self.reservations
            .get(id)
            .await?
            .ok_or_else(|| BookingError::reservation_not_found(id))
    }

    /// Book a slot.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] for missing or malformed fields, or a
    ///   time that is not in the venue's slot catalog
    /// - [`BookingError::NotFound`] if the venue does not exist
    /// - [`BookingError::Conflict`] if the slot is blocked or already held
    /// - [`BookingError::Unavailable`] if a store fails
    pub async fn create(&self, request: CreateReservation) -> Result<Reservation> {
        let user_id = request.user_id.clone();
        let valid = validate(&request)?;

        let venue = self
            .venues
            .venue(valid.venue_id)
            .await?
            .ok_or_else(|| BookingError::venue_not_found(valid.venue_id))?;

        let settings = self.settings.get().await?;
        if !effective_catalog(&venue, &settings).contains(&valid.time) {
            return Err(BookingError::validation(format!(
                "{} is not a bookable time for this venue",
                valid.time
            )));
        }
        if settings.is_blocked(valid.date, valid.time) {
            tracing::info!(
                venue_id = %valid.venue_id,
                date = %valid.date,
                time = %valid.time,
                "Reservation refused: slot blocked"
            );
            return Err(BookingError::Conflict {
                venue_id: valid.venue_id,
                date: valid.date,
                time: valid.time,
                reason: ConflictReason::SlotBlocked,
            });
        }

        let reservation = Reservation {
            id: ReservationId::new(),
            venue_id: valid.venue_id,
            user_id,
            customer_name: valid.customer_name,
            customer_surname: valid.customer_surname,
            phone: valid.phone,
            date: valid.date,
            time: valid.time,
            price: pricing::price(&venue.pricing, valid.date, valid.time),
            status: ReservationStatus::Pending,
            created_at: self.clock.now(),
        };

        match self.reservations.insert_if_slot_free(reservation).await {
            Ok(created) => {
                tracing::info!(
                    reservation_id = %created.id,
                    venue_id = %created.venue_id,
                    date = %created.date,
                    time = %created.time,
                    price = %created.price,
                    "Reservation created"
                );
                Ok(created)
            }
            Err(error @ BookingError::Conflict { .. }) => {
                tracing::warn!(
                    venue_id = %valid.venue_id,
                    date = %valid.date,
                    time = %valid.time,
                    "Reservation refused: slot already held"
                );
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    /// Move a reservation to `next`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if no reservation has this id
    /// - [`BookingError::InvalidTransition`] if `current -> next` is not allowed
    /// - [`BookingError::Unavailable`] if the store fails, or concurrent
    ///   writers keep changing the status underneath
    pub async fn set_status(
        &self,
        id: ReservationId,
        next: ReservationStatus,
    ) -> Result<Reservation> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let current = self.get(id).await?;

            if !current.status.can_transition_to(next) {
                return Err(BookingError::InvalidTransition {
                    from: current.status,
                    to: next,
                });
            }

            if let Some(updated) = self
                .reservations
                .compare_and_set_status(id, current.status, next)
                .await?
            {
                tracing::info!(
                    reservation_id = %id,
                    from = %current.status,
                    to = %next,
                    "Reservation status changed"
                );
                return Ok(updated);
            }

            tracing::debug!(reservation_id = %id, "Status changed concurrently, re-reading");
        }

        Err(BookingError::unavailable(format!(
            "reservation {id} is being modified concurrently"
        )))
    }
}

/// Check presence and format of every request field.
fn validate(request: &CreateReservation) -> Result<ValidRequest> {
    let required = [
        ("venue_id", request.venue_id.trim()),
        ("customer_name", request.customer_name.trim()),
        ("customer_surname", request.customer_surname.trim()),
        ("phone", request.phone.trim()),
        ("date", request.date.trim()),
        ("time", request.time.trim()),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(BookingError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(ValidRequest {
        venue_id: request.venue_id.parse()?,
        customer_name: request.customer_name.trim().to_string(),
        customer_surname: request.customer_surname.trim().to_string(),
        phone: request.phone.trim().to_string(),
        date: parse_date(&request.date)?,
        time: request.time.parse()?,
    })
}
