//! Domain types for the reservation engine.
//!
//! Value objects (identifiers, time-slot labels, money), the reservation
//! entity with its status state machine, the venue view consumed from the
//! external catalog, and the actor identity used for privileged operations.

use crate::error::BookingError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(Uuid);

impl VenueId {
    /// Creates a new random `VenueId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `VenueId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VenueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VenueId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| BookingError::validation(format!("invalid venue id: {s}")))
    }
}

/// Unique identifier for a reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random `ReservationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReservationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReservationId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| BookingError::validation(format!("invalid reservation id: {s}")))
    }
}

/// Opaque identifier of a customer account, issued by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// A canonical time-slot label such as `"17:00"`.
///
/// Always rendered as zero-padded `HH:MM`. Ordering follows the clock, which
/// coincides with the lexical order of the label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    hour: u8,
    minute: u8,
}

impl TimeSlot {
    /// Build a slot from hour and minute components.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the hour is above 23 or the
    /// minute above 59.
    pub fn new(hour: u8, minute: u8) -> Result<Self, BookingError> {
        if hour > 23 || minute > 59 {
            return Err(BookingError::validation(format!(
                "time slot out of range: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Hour component (0-23).
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute component (0-59).
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeSlot {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BookingError::validation(format!("malformed time slot: {s:?}"));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(malformed)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(malformed());
        }
        let hour: u8 = hour.parse().map_err(|_| malformed())?;
        let minute: u8 = minute.parse().map_err(|_| malformed())?;

        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] if the string is not a valid date.
pub fn parse_date(s: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        BookingError::validation(format!("malformed date (expected YYYY-MM-DD): {s:?}"))
    })
}

/// A price in whole currency units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from whole units
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Returns the amount in whole units
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Adds two amounts, saturating at `u64::MAX`
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Reservation
// ============================================================================

/// Reservation lifecycle status.
///
/// ```text
///         create
///   (∅) ────────► Pending ──approve──► Approved ──complete──► Completed
///                   │                     │
///                 cancel                cancel
///                   ▼                     ▼
///               Cancelled             Cancelled
/// ```
///
/// `Pending` and `Approved` hold their slot; `Cancelled` and `Completed` do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Requested by a customer, awaiting the owner.
    Pending,
    /// Confirmed by the owner or an administrator.
    Approved,
    /// Withdrawn; the slot is free again.
    Cancelled,
    /// Played out; bookkeeping only.
    Completed,
}

impl ReservationStatus {
    /// Statuses that hold their slot.
    pub const HOLDING: [Self; 2] = [Self::Pending, Self::Approved];

    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Whether a reservation in this status occupies its slot.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// The transition table. Anything not listed here is rejected.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Cancelled)
                | (Self::Approved, Self::Cancelled | Self::Completed)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(BookingError::validation(format!("unknown reservation status: {s}"))),
        }
    }
}

/// A reservation of one slot on one venue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Identity.
    pub id: ReservationId,
    /// Reserved venue (immutable).
    pub venue_id: VenueId,
    /// Customer account, when the booking was made while signed in.
    pub user_id: Option<UserId>,
    /// Customer first name.
    pub customer_name: String,
    /// Customer surname.
    pub customer_surname: String,
    /// Contact phone number.
    pub phone: String,
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Time label of the slot.
    pub time: TimeSlot,
    /// Price stamped at creation.
    pub price: Money,
    /// Lifecycle status.
    pub status: ReservationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The contended `(venue, date, time)` key.
    #[must_use]
    pub const fn slot(&self) -> SlotKey {
        SlotKey {
            venue_id: self.venue_id,
            date: self.date,
            time: self.time,
        }
    }
}

/// A `(venue, date, time)` triple; the unit of contention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    /// Venue.
    pub venue_id: VenueId,
    /// Date.
    pub date: NaiveDate,
    /// Time label.
    pub time: TimeSlot,
}

/// A customer's booking request as received from the outside world.
///
/// Fields are raw strings so that a missing or blank value surfaces as a
/// [`BookingError::Validation`] from the ledger rather than a decode failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateReservation {
    /// Venue to book (UUID).
    pub venue_id: String,
    /// Customer first name.
    pub customer_name: String,
    /// Customer surname.
    pub customer_surname: String,
    /// Contact phone number.
    pub phone: String,
    /// Date, `YYYY-MM-DD`.
    pub date: String,
    /// Time label, `HH:MM`.
    pub time: String,
    /// Signed-in customer, if any.
    pub user_id: Option<UserId>,
}

// ============================================================================
// Venue (external catalog view)
// ============================================================================

/// Tariff of a venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    /// Base price Monday to Friday.
    pub weekday: Money,
    /// Base price Saturday and Sunday.
    pub weekend: Money,
    /// Surcharge for night slots.
    pub night_extra: Money,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            weekday: Money::new(1000),
            weekend: Money::new(1200),
            night_extra: Money::new(200),
        }
    }
}

/// Publication status of a venue listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    /// Awaiting review.
    #[default]
    Pending,
    /// Publicly listed.
    Approved,
    /// Refused by review.
    Rejected,
}

impl VenueStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for VenueStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(BookingError::validation(format!("unknown venue status: {s}"))),
        }
    }
}

/// The slice of a venue record the engine needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    /// Identity.
    pub id: VenueId,
    /// Display name.
    pub name: String,
    /// Tariff.
    pub pricing: Pricing,
    /// Bookable slots in display order. Empty means "use the global default".
    pub time_slots: Vec<TimeSlot>,
    /// Listing status.
    pub status: VenueStatus,
}

// ============================================================================
// Actors
// ============================================================================

/// Role carried by an authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Venue owner.
    Owner,
    /// Regular customer.
    Customer,
}

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Account identifier.
    pub user_id: UserId,
    /// Granted role.
    pub role: Role,
}

impl Actor {
    /// Whether this actor may change global settings.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may drive reservations through their lifecycle.
    #[must_use]
    pub fn can_manage_reservations(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Owner)
    }
}
