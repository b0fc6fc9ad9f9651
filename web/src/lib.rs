//! HTTP surface of the Fieldbook reservation engine.
//!
//! Thin axum handlers over the engine components in `fieldbook-core`:
//!
//! ```text
//! HTTP request
//!   → extractors (JSON body, query, bearer token → Actor)
//!   → ReservationLedger / AvailabilityResolver / SettingsStore
//!   → BookingError → AppError → status code + {code, message}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fieldbook_web::{build_router, AppState, TokenVerifier};
//!
//! let state = AppState::new(ledger, availability, settings, TokenVerifier::new(secret));
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiQuery, Authenticated, Claims, MaybeAuthenticated, TokenVerifier};
pub use router::build_router;
pub use state::AppState;
