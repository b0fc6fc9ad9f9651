//! Pricing Calculator.
//!
//! `price = base(date) + night_extra?(time)` where the base is the weekend
//! tariff on Saturday/Sunday and the weekday tariff otherwise, and the night
//! surcharge applies to slots starting at 20:00 or later, or at 02:00 or
//! earlier (a slot past midnight still belongs to the evening).

use crate::types::{Money, Pricing, TimeSlot};
use chrono::{Datelike, NaiveDate, Weekday};

/// First hour (inclusive) of the evening night band.
pub const NIGHT_START_HOUR: u8 = 20;

/// Last hour (inclusive) of the after-midnight night band.
pub const NIGHT_END_HOUR: u8 = 2;

/// Whether the date falls on a weekend.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether the slot is priced as a night slot.
#[must_use]
pub const fn is_night(time: TimeSlot) -> bool {
    let hour = time.hour();
    hour >= NIGHT_START_HOUR || hour <= NIGHT_END_HOUR
}

/// Price of a slot on a venue with the given tariff.
///
/// Pure and deterministic. Malformed time labels are rejected earlier, when
/// the label is parsed into a [`TimeSlot`].
#[must_use]
pub fn price(pricing: &Pricing, date: NaiveDate, time: TimeSlot) -> Money {
    let base = if is_weekend(date) {
        pricing.weekend
    } else {
        pricing.weekday
    };

    if is_night(time) {
        base.saturating_add(pricing.night_extra)
    } else {
        base
    }
}
