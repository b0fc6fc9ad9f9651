//! Application state for Axum handlers.

use crate::extractors::TokenVerifier;
use fieldbook_core::{AvailabilityResolver, ReservationLedger, SettingsStore};

/// Application state shared across all HTTP handlers.
///
/// Every field is a cheap handle; cloning the state per request is fine.
#[derive(Clone)]
pub struct AppState {
    /// Reservation creation, listing and lifecycle.
    pub ledger: ReservationLedger,
    /// Open-slot queries.
    pub availability: AvailabilityResolver,
    /// Settings singleton.
    pub settings: SettingsStore,
    /// Bearer-token verification.
    pub tokens: TokenVerifier,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(
        ledger: ReservationLedger,
        availability: AvailabilityResolver,
        settings: SettingsStore,
        tokens: TokenVerifier,
    ) -> Self {
        Self {
            ledger,
            availability,
            settings,
            tokens,
        }
    }
}
