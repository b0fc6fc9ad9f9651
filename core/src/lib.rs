//! # Fieldbook Core
//!
//! Reservation slot allocation engine for bookable sports venues.
//!
//! Field owners publish venues with a tariff and a list of hourly slots;
//! customers reserve one `(venue, date, time)` slot at a time. The engine
//! guarantees that two concurrent customers can never both hold the same slot,
//! while still letting administrators block slots and drive reservations
//! through their status lifecycle.
//!
//! ## Components
//!
//! - [`pricing`]: pure price calculation from tariff, date and time
//! - [`availability::AvailabilityResolver`]: open slots for a venue and date
//! - [`ledger::ReservationLedger`]: atomic create and status transitions
//! - [`settings::SettingsStore`]: the lazily created settings singleton
//! - [`repository`]: persistence ports implemented by the storage crates
//!
//! ## Flow
//!
//! ```text
//! client ──openSlots──► AvailabilityResolver ──► SettingsStore + ReservationLedger
//! client ──create─────► ReservationLedger ──price──► pricing
//!                                         ──atomic insert──► ReservationRepository
//! admin  ──setStatus──► ReservationLedger ──compare-and-set──► ReservationRepository
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use fieldbook_core::{CreateReservation, ReservationLedger};
//!
//! let reservation = ledger
//!     .create(CreateReservation {
//!         venue_id: venue_id.to_string(),
//!         customer_name: "Ada".into(),
//!         customer_surname: "Yilmaz".into(),
//!         phone: "5550000000".into(),
//!         date: "2026-02-28".into(),
//!         time: "21:00".into(),
//!         user_id: None,
//!     })
//!     .await?;
//! assert_eq!(reservation.price.amount(), 1400);
//! ```

#![forbid(unsafe_code)]

pub mod availability;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod repository;
pub mod settings;
pub mod types;

/// Injected dependencies that are not storage.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

// Re-export commonly used types
pub use availability::{AvailabilityResolver, OpenSlots};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, ConflictReason, Result};
pub use ledger::ReservationLedger;
pub use repository::{ReservationFilter, ReservationRepository, SettingsRepository, VenueCatalog};
pub use settings::{BlockedSlots, Service, Settings, SettingsPatch, SettingsStore};
pub use types::{
    Actor, CreateReservation, Money, Pricing, Reservation, ReservationId, ReservationStatus,
    Role, SlotKey, TimeSlot, UserId, Venue, VenueId, VenueStatus,
};
