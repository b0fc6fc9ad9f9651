//! Availability Resolver.
//!
//! Open slots for `(venue, date)` are computed fresh on every call:
//!
//! 1. start from the venue's slot list (or the global default when it has none),
//!    keeping its display order
//! 2. drop labels blocked for that date in the settings
//! 3. drop labels held by an active reservation on that venue and date
//!
//! Nothing is cached between calls, so a cancellation is visible on the very
//! next read.

use crate::error::{BookingError, Result};
use crate::ledger::ReservationLedger;
use crate::repository::{ReservationFilter, VenueCatalog};
use crate::settings::{Settings, SettingsStore};
use crate::types::{Reservation, TimeSlot, Venue, VenueId};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

/// Slot catalog in effect for a venue: its own list, or the global default.
#[must_use]
pub fn effective_catalog<'a>(venue: &'a Venue, settings: &'a Settings) -> &'a [TimeSlot] {
    if venue.time_slots.is_empty() {
        &settings.time_slots
    } else {
        &venue.time_slots
    }
}

/// The bookable slots of one venue on one date.
///
/// A finite, restartable sequence: [`OpenSlots::iter`] may be called any
/// number of times and always yields the same labels in catalog order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenSlots {
    venue_id: VenueId,
    date: NaiveDate,
    candidates: Vec<TimeSlot>,
    excluded: HashSet<TimeSlot>,
}

impl OpenSlots {
    /// Compute open slots from already-loaded inputs.
    ///
    /// `active` is expected to hold the active reservations of `venue` on
    /// `date`; anything else in it is ignored.
    #[must_use]
    pub fn compute(
        venue: &Venue,
        date: NaiveDate,
        settings: &Settings,
        active: &[Reservation],
    ) -> Self {
        let mut seen = HashSet::new();
        let candidates = effective_catalog(venue, settings)
            .iter()
            .copied()
            .filter(|slot| seen.insert(*slot))
            .collect();

        let mut excluded: HashSet<TimeSlot> = settings
            .blocked_slots
            .get(&date)
            .map(|blocked| blocked.iter().copied().collect())
            .unwrap_or_default();

        excluded.extend(
            active
                .iter()
                .filter(|r| r.venue_id == venue.id && r.date == date && r.status.is_holding())
                .map(|r| r.time),
        );

        Self {
            venue_id: venue.id,
            date,
            candidates,
            excluded,
        }
    }

    /// Venue these slots belong to.
    #[must_use]
    pub const fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    /// Date these slots belong to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Iterate open slots in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.candidates
            .iter()
            .copied()
            .filter(|slot| !self.excluded.contains(slot))
    }

    /// Whether `slot` is open.
    #[must_use]
    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.candidates.contains(&slot) && !self.excluded.contains(&slot)
    }

    /// Number of open slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no slot is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Collect open slots.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TimeSlot> {
        self.iter().collect()
    }
}

/// Engine component answering "which slots can still be booked?".
#[derive(Clone)]
pub struct AvailabilityResolver {
    venues: Arc<dyn VenueCatalog>,
    settings: SettingsStore,
    ledger: ReservationLedger,
}

impl AvailabilityResolver {
    /// Create the resolver.
    #[must_use]
    pub fn new(
        venues: Arc<dyn VenueCatalog>,
        settings: SettingsStore,
        ledger: ReservationLedger,
    ) -> Self {
        Self {
            venues,
            settings,
            ledger,
        }
    }

    /// Open slots of `venue_id` on `date`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the venue does not exist
    /// - [`BookingError::Unavailable`] if a store fails
    pub async fn open_slots(&self, venue_id: VenueId, date: NaiveDate) -> Result<OpenSlots> {
        let venue = self
            .venues
            .venue(venue_id)
            .await?
            .ok_or_else(|| BookingError::venue_not_found(venue_id))?;

        let settings = self.settings.get().await?;
        let active = self
            .ledger
            .list(ReservationFilter::Slot { venue_id, date })
            .await?;

        let open = OpenSlots::compute(&venue, date, &settings, &active);

        tracing::debug!(
            venue_id = %venue_id,
            date = %date,
            open = open.len(),
            held = active.len(),
            "Resolved open slots"
        );

        Ok(open)
    }
}

impl<'a> IntoIterator for &'a OpenSlots {
    type Item = TimeSlot;
    type IntoIter = Box<dyn Iterator<Item = TimeSlot> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
