//! Error taxonomy for the reservation engine.
//!
//! Every operation in this crate fails with exactly one [`BookingError`] variant.
//! The variants are deliberately coarse: they describe what the *caller* should
//! do next, not which line of code failed.
//!
//! | Variant | Caller reaction |
//! |---|---|
//! | [`BookingError::Validation`] | Fix the input. Never retried automatically. |
//! | [`BookingError::NotFound`] | The referenced venue or reservation does not exist. |
//! | [`BookingError::Conflict`] | Re-fetch availability and pick a *different* slot. |
//! | [`BookingError::InvalidTransition`] | The status change is not in the transition table. |
//! | [`BookingError::Authorization`] | Missing, invalid or insufficient credentials. |
//! | [`BookingError::Unavailable`] | Backing store failed; safe to retry with backoff. |

use crate::types::{ReservationStatus, TimeSlot, VenueId};
use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Why a slot could not be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Another active reservation already holds the slot.
    SlotHeld,
    /// An administrator blocked the slot for that date.
    SlotBlocked,
}

/// Errors produced by the reservation engine and its stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Missing or malformed input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of entity (`"venue"`, `"reservation"`).
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The requested slot cannot be reserved.
    #[error("Slot {venue_id} {date} {time} unavailable ({reason:?})")]
    Conflict {
        /// Venue of the contested slot.
        venue_id: VenueId,
        /// Date of the contested slot.
        date: NaiveDate,
        /// Time label of the contested slot.
        time: TimeSlot,
        /// Why the slot is unavailable.
        reason: ConflictReason,
    },

    /// Status change not present in the transition table.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: ReservationStatus,
        /// Requested status.
        to: ReservationStatus,
    },

    /// Caller is not allowed to perform the operation.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Backing store failure or timeout.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl BookingError {
    /// Shorthand for a [`BookingError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing venue.
    #[must_use]
    pub fn venue_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "venue",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing reservation.
    #[must_use]
    pub fn reservation_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            resource: "reservation",
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`BookingError::Unavailable`].
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether a caller may retry the identical request later.
    ///
    /// Only store failures qualify. Retrying a conflict on the same slot is
    /// never correct.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_names_the_slot() {
        let venue_id = VenueId::new();
        let error = BookingError::Conflict {
            venue_id,
            date: NaiveDate::from_ymd_opt(2026, 2, 25).unwrap(),
            time: "19:00".parse().unwrap(),
            reason: ConflictReason::SlotHeld,
        };

        let display = error.to_string();
        assert!(display.contains("2026-02-25"));
        assert!(display.contains("19:00"));
        assert!(display.contains(&venue_id.to_string()));
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(BookingError::unavailable("pool timed out").is_retryable());
        assert!(!BookingError::validation("phone is required").is_retryable());
        assert!(!BookingError::reservation_not_found("abc").is_retryable());
    }

    #[test]
    fn invalid_transition_display() {
        let error = BookingError::InvalidTransition {
            from: ReservationStatus::Pending,
            to: ReservationStatus::Completed,
        };
        assert_eq!(
            error.to_string(),
            "Invalid status transition: pending -> completed"
        );
    }
}
