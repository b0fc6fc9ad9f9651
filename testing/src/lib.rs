//! # Fieldbook Testing
//!
//! Testing utilities for the reservation engine.
//!
//! This crate provides:
//! - In-memory implementations of the repository ports
//! - A fixed clock for deterministic timestamps
//! - Fixtures for venues, requests and actors
//! - [`TestEngine`]: the full engine wired onto in-memory stores
//!
//! ## Example
//!
//! ```
//! use fieldbook_testing::{fixtures, TestEngine};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = TestEngine::new();
//! let venue = engine.add_venue(fixtures::venue(&["17:00", "18:00"]));
//!
//! let reservation = engine
//!     .ledger
//!     .create(fixtures::request(&venue, "2026-02-24", "18:00"))
//!     .await?;
//! assert_eq!(reservation.price.amount(), 1000);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use fieldbook_core::environment::Clock;

pub mod memory;

pub use memory::{InMemoryReservationRepository, InMemorySettingsRepository, InMemoryVenueCatalog};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until explicitly advanced.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldbook_testing::mocks::FixedClock;
    /// use fieldbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: chrono::Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.lock().map_or_else(|p| *p.into_inner(), |t| *t)
        }
    }

    /// Create a default fixed clock for tests (2026-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Builders for common test inputs.
#[allow(clippy::expect_used, clippy::missing_panics_doc)]
pub mod fixtures {
    use fieldbook_core::types::{
        Actor, CreateReservation, Money, Pricing, Role, TimeSlot, UserId, Venue, VenueId,
        VenueStatus,
    };

    /// Parse a slot label, panicking on typos in test code.
    #[must_use]
    pub fn slot(label: &str) -> TimeSlot {
        label.parse().expect("fixture time slot should parse")
    }

    /// Parse several slot labels.
    #[must_use]
    pub fn slots(labels: &[&str]) -> Vec<TimeSlot> {
        labels.iter().map(|label| slot(label)).collect()
    }

    /// An approved venue with the reference tariff (1000 / 1200 / +200).
    #[must_use]
    pub fn venue(time_slots: &[&str]) -> Venue {
        Venue {
            id: VenueId::new(),
            name: "Kadikoy Arena".to_string(),
            pricing: Pricing {
                weekday: Money::new(1000),
                weekend: Money::new(1200),
                night_extra: Money::new(200),
            },
            time_slots: slots(time_slots),
            status: VenueStatus::Approved,
        }
    }

    /// A complete, valid booking request.
    #[must_use]
    pub fn request(venue: &Venue, date: &str, time: &str) -> CreateReservation {
        CreateReservation {
            venue_id: venue.id.to_string(),
            customer_name: "Ada".to_string(),
            customer_surname: "Yilmaz".to_string(),
            phone: "+90 555 000 00 00".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            user_id: None,
        }
    }

    /// An administrator.
    #[must_use]
    pub fn admin() -> Actor {
        Actor {
            user_id: UserId("admin-1".to_string()),
            role: Role::Admin,
        }
    }

    /// A venue owner.
    #[must_use]
    pub fn owner() -> Actor {
        Actor {
            user_id: UserId("owner-1".to_string()),
            role: Role::Owner,
        }
    }

    /// A customer.
    #[must_use]
    pub fn customer() -> Actor {
        Actor {
            user_id: UserId("customer-1".to_string()),
            role: Role::Customer,
        }
    }
}

mod engine {
    use crate::memory::{
        InMemoryReservationRepository, InMemorySettingsRepository, InMemoryVenueCatalog,
    };
    use crate::mocks::{test_clock, FixedClock};
    use fieldbook_core::{AvailabilityResolver, ReservationLedger, SettingsStore, Venue};
    use std::sync::Arc;

    /// The full engine wired onto in-memory stores.
    ///
    /// Store handles are exposed so tests can inspect or sabotage them.
    #[derive(Clone)]
    pub struct TestEngine {
        /// Reservation Ledger.
        pub ledger: ReservationLedger,
        /// Availability Resolver.
        pub availability: AvailabilityResolver,
        /// Settings Store.
        pub settings: SettingsStore,
        /// Backing reservation rows.
        pub reservations: InMemoryReservationRepository,
        /// Backing settings singleton.
        pub settings_repository: InMemorySettingsRepository,
        /// Venue catalog.
        pub venues: InMemoryVenueCatalog,
        /// Shared clock.
        pub clock: FixedClock,
    }

    impl TestEngine {
        /// Engine with empty stores and [`test_clock`].
        #[must_use]
        pub fn new() -> Self {
            Self::with_settings_repository(InMemorySettingsRepository::new())
        }

        /// Engine on top of a pre-populated settings store.
        #[must_use]
        pub fn with_settings_repository(settings_repository: InMemorySettingsRepository) -> Self {
            let reservations = InMemoryReservationRepository::new();
            let venues = InMemoryVenueCatalog::new();
            let clock = test_clock();

            let settings =
                SettingsStore::new(Arc::new(settings_repository.clone()), Arc::new(clock.clone()));
            let ledger = ReservationLedger::new(
                Arc::new(reservations.clone()),
                Arc::new(venues.clone()),
                settings.clone(),
                Arc::new(clock.clone()),
            );
            let availability = AvailabilityResolver::new(
                Arc::new(venues.clone()),
                settings.clone(),
                ledger.clone(),
            );

            Self {
                ledger,
                availability,
                settings,
                reservations,
                settings_repository,
                venues,
                clock,
            }
        }

        /// Register a venue in the catalog and hand it back.
        #[must_use]
        pub fn add_venue(&self, venue: Venue) -> Venue {
            self.venues.insert(venue.clone());
            venue
        }
    }

    impl Default for TestEngine {
        fn default() -> Self {
            Self::new()
        }
    }
}

pub use engine::TestEngine;
pub use mocks::{test_clock, FixedClock};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldbook=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = test_clock();
        let before = clock.now();
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now() - before, chrono::Duration::minutes(5));
    }
}
