//! In-memory repository implementations.
//!
//! Fast, deterministic stand-ins for the `PostgreSQL` stores:
//! - [`InMemoryReservationRepository`]: check-and-insert under one write lock
//! - [`InMemorySettingsRepository`]: get-or-create under one lock
//! - [`InMemoryVenueCatalog`]: a mutable venue map
//!
//! Each store can be switched into an "unavailable" mode to exercise the
//! engine's store-failure path.

use chrono::{DateTime, Utc};
use fieldbook_core::error::{BookingError, ConflictReason, Result};
use fieldbook_core::repository::{
    ReservationFilter, ReservationRepository, SettingsRepository, StoreFuture, VenueCatalog,
};
use fieldbook_core::settings::{Settings, SettingsPatch};
use fieldbook_core::types::{Reservation, ReservationId, ReservationStatus, Venue, VenueId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

fn poisoned() -> BookingError {
    BookingError::unavailable("in-memory store lock poisoned")
}

fn outage(store: &str) -> BookingError {
    BookingError::unavailable(format!("{store} is offline"))
}

/// In-memory reservation store.
///
/// # Example
///
/// ```
/// use fieldbook_testing::InMemoryReservationRepository;
///
/// let store = InMemoryReservationRepository::new();
/// assert!(store.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryReservationRepository {
    rows: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryReservationRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a store outage: every call fails with `Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored reservations, any status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().map_or(0, |rows| rows.len())
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored reservation.
    #[must_use]
    pub fn all(&self) -> Vec<Reservation> {
        self.rows
            .read()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(outage("reservation store"))
        } else {
            Ok(())
        }
    }
}

impl ReservationRepository for InMemoryReservationRepository {
    fn insert_if_slot_free(&self, reservation: Reservation) -> StoreFuture<'_, Reservation> {
        Box::pin(async move {
            self.check_online()?;
            let mut rows = self.rows.write().map_err(|_| poisoned())?;

            let slot = reservation.slot();
            let held = rows
                .values()
                .any(|existing| existing.status.is_holding() && existing.slot() == slot);
            if held {
                return Err(BookingError::Conflict {
                    venue_id: slot.venue_id,
                    date: slot.date,
                    time: slot.time,
                    reason: ConflictReason::SlotHeld,
                });
            }

            rows.insert(reservation.id, reservation.clone());
            Ok(reservation)
        })
    }

    fn get(&self, id: ReservationId) -> StoreFuture<'_, Option<Reservation>> {
        Box::pin(async move {
            self.check_online()?;
            let rows = self.rows.read().map_err(|_| poisoned())?;
            Ok(rows.get(&id).cloned())
        })
    }

    fn list(&self, filter: ReservationFilter) -> StoreFuture<'_, Vec<Reservation>> {
        Box::pin(async move {
            self.check_online()?;
            let rows = self.rows.read().map_err(|_| poisoned())?;
            let mut selected: Vec<Reservation> =
                rows.values().filter(|r| filter.matches(r)).cloned().collect();
            selected.sort_by(|a, b| {
                (a.date, a.time, a.created_at).cmp(&(b.date, b.time, b.created_at))
            });
            Ok(selected)
        })
    }

    fn compare_and_set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> StoreFuture<'_, Option<Reservation>> {
        Box::pin(async move {
            self.check_online()?;
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            Ok(rows
                .get_mut(&id)
                .filter(|row| row.status == expected)
                .map(|row| {
                    row.status = next;
                    row.clone()
                }))
        })
    }
}

/// In-memory settings singleton.
#[derive(Clone, Debug, Default)]
pub struct InMemorySettingsRepository {
    current: Arc<Mutex<Option<Settings>>>,
    creations: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl InMemorySettingsRepository {
    /// Create a store with no singleton yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `settings`.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        if let Ok(mut current) = store.current.lock() {
            *current = Some(settings);
        }
        store
    }

    /// How many times the singleton was created. Never more than one.
    #[must_use]
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Simulate a store outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(outage("settings store"))
        } else {
            Ok(())
        }
    }
}

impl SettingsRepository for InMemorySettingsRepository {
    fn get_or_create(&self, defaults: Settings) -> StoreFuture<'_, Settings> {
        Box::pin(async move {
            self.check_online()?;
            let mut current = self.current.lock().map_err(|_| poisoned())?;
            let settings = current.get_or_insert_with(|| {
                self.creations.fetch_add(1, Ordering::SeqCst);
                defaults
            });
            Ok(settings.clone())
        })
    }

    fn apply_patch(
        &self,
        defaults: Settings,
        patch: SettingsPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Settings> {
        Box::pin(async move {
            self.check_online()?;
            let mut current = self.current.lock().map_err(|_| poisoned())?;
            let settings = current.get_or_insert_with(|| {
                self.creations.fetch_add(1, Ordering::SeqCst);
                defaults
            });
            patch.apply_to(settings, updated_at);
            Ok(settings.clone())
        })
    }
}

/// In-memory venue catalog.
#[derive(Clone, Debug, Default)]
pub struct InMemoryVenueCatalog {
    venues: Arc<RwLock<HashMap<VenueId, Venue>>>,
}

impl InMemoryVenueCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a venue.
    pub fn insert(&self, venue: Venue) {
        if let Ok(mut venues) = self.venues.write() {
            venues.insert(venue.id, venue);
        }
    }

    /// Remove a venue.
    pub fn remove(&self, id: VenueId) {
        if let Ok(mut venues) = self.venues.write() {
            venues.remove(&id);
        }
    }
}

impl VenueCatalog for InMemoryVenueCatalog {
    fn venue(&self, id: VenueId) -> StoreFuture<'_, Option<Venue>> {
        Box::pin(async move {
            let venues = self.venues.read().map_err(|_| poisoned())?;
            Ok(venues.get(&id).cloned())
        })
    }
}
