//! Persistence ports for the reservation engine.
//!
//! The engine is storage-agnostic. It needs three collaborators:
//!
//! - [`ReservationRepository`]: reservation rows plus the *atomic conditional
//!   insert* that enforces "at most one active reservation per slot"
//! - [`SettingsRepository`]: the settings singleton with atomic get-or-create
//!   and atomic partial upsert
//! - [`VenueCatalog`]: read-only view of the external venue catalog
//!
//! # Implementations
//!
//! - `fieldbook-postgres`: production implementations backed by `PostgreSQL`
//!   (partial unique index on the active slot, `ON CONFLICT` upserts)
//! - `fieldbook-testing`: in-memory implementations for fast, deterministic tests
//!
//! # Atomicity contract
//!
//! [`ReservationRepository::insert_if_slot_free`] MUST check and insert in one
//! atomic step. A read followed by a separate write lets two concurrent
//! requests both observe a free slot and both commit, which is exactly the
//! double booking the engine exists to prevent.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! engine can hold `Arc<dyn ReservationRepository>` and friends.

use crate::error::Result;
use crate::settings::{Settings, SettingsPatch};
use crate::types::{Reservation, ReservationId, ReservationStatus, UserId, Venue, VenueId};
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by repository methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Selection of reservations for listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservationFilter {
    /// Every reservation. Intended for privileged callers.
    All,
    /// Active reservations of one venue on one date.
    Slot {
        /// Venue.
        venue_id: VenueId,
        /// Date.
        date: NaiveDate,
    },
    /// All reservations of one customer, any status.
    User(UserId),
    /// All reservations of one venue, any status.
    Venue(VenueId),
}

impl ReservationFilter {
    /// Whether a reservation is selected by this filter.
    #[must_use]
    pub fn matches(&self, reservation: &Reservation) -> bool {
        match self {
            Self::All => true,
            Self::Slot { venue_id, date } => {
                reservation.venue_id == *venue_id
                    && reservation.date == *date
                    && reservation.status.is_holding()
            }
            Self::User(user_id) => reservation.user_id.as_ref() == Some(user_id),
            Self::Venue(venue_id) => reservation.venue_id == *venue_id,
        }
    }
}

/// Reservation persistence.
pub trait ReservationRepository: Send + Sync {
    /// Insert `reservation` unless an active reservation already holds its slot.
    ///
    /// Check and insert happen as one atomic operation.
    ///
    /// # Errors
    ///
    /// - `Conflict { reason: SlotHeld }`: another pending/approved reservation
    ///   holds the same `(venue_id, date, time)`; nothing was written
    /// - `Unavailable`: the store failed
    fn insert_if_slot_free(&self, reservation: Reservation) -> StoreFuture<'_, Reservation>;

    /// Load one reservation.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store failed
    fn get(&self, id: ReservationId) -> StoreFuture<'_, Option<Reservation>>;

    /// List reservations selected by `filter`, ordered by `(date, time)` ascending.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store failed
    fn list(&self, filter: ReservationFilter) -> StoreFuture<'_, Vec<Reservation>>;

    /// Set the status to `next` only if it is currently `expected`.
    ///
    /// Returns the updated row, or `None` when the reservation is missing or
    /// its status is no longer `expected`.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store failed
    fn compare_and_set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> StoreFuture<'_, Option<Reservation>>;
}

/// Settings singleton persistence.
pub trait SettingsRepository: Send + Sync {
    /// Return the singleton, creating it from `defaults` if absent.
    ///
    /// Concurrent first calls MUST converge on a single record.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store failed
    fn get_or_create(&self, defaults: Settings) -> StoreFuture<'_, Settings>;

    /// Apply `patch` to the singleton (creating it from `defaults` first if
    /// absent) and stamp `updated_at`, atomically.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the store failed
    fn apply_patch(
        &self,
        defaults: Settings,
        patch: SettingsPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Settings>;
}

/// Read access to the external venue catalog.
pub trait VenueCatalog: Send + Sync {
    /// Look up a venue.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the catalog failed
    fn venue(&self, id: VenueId) -> StoreFuture<'_, Option<Venue>>;
}
