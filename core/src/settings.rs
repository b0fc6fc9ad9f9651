//! Settings Store.
//!
//! A process-wide singleton (fixed key [`SETTINGS_KEY`]) holding the service
//! catalog, the default time-slot list and the administrator's blocked slots.
//! It is created lazily with [`Settings::defaults`] on first read and mutated
//! only by administrators through partial updates.

use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::repository::SettingsRepository;
use crate::types::{Actor, Money, TimeSlot};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Fixed key of the settings singleton.
pub const SETTINGS_KEY: &str = "main";

/// Administrator-blocked slots: date → set of time labels.
pub type BlockedSlots = BTreeMap<NaiveDate, BTreeSet<TimeSlot>>;

/// One entry of the informational service catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Stable identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Listed price.
    pub price: Money,
    /// Human-readable duration, e.g. `~30 min`.
    pub duration: String,
    /// Free-form note.
    #[serde(default)]
    pub note: String,
}

impl Service {
    fn new(id: &str, label: &str, price: u64, duration: &str, note: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            price: Money::new(price),
            duration: duration.to_string(),
            note: note.to_string(),
        }
    }
}

/// The settings singleton.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Service catalog (not enforced by the ledger).
    pub services: Vec<Service>,
    /// Slots used by venues that define none.
    pub time_slots: Vec<TimeSlot>,
    /// Slots that are unavailable regardless of reservations.
    pub blocked_slots: BlockedSlots,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Built-in defaults used when the singleton does not exist yet.
    #[must_use]
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            services: default_services(),
            time_slots: default_time_slots(),
            blocked_slots: BlockedSlots::new(),
            updated_at: now,
        }
    }

    /// Whether `time` is blocked on `date`.
    #[must_use]
    pub fn is_blocked(&self, date: NaiveDate, time: TimeSlot) -> bool {
        self.blocked_slots
            .get(&date)
            .is_some_and(|slots| slots.contains(&time))
    }
}

fn default_services() -> Vec<Service> {
    vec![
        Service::new("haircut", "Haircut", 200, "~30 min", ""),
        Service::new("haircut-wash", "Haircut + Wash", 300, "~45 min", ""),
        Service::new("haircut-beard-wash", "Haircut, Beard + Wash", 400, "~1 hour", ""),
        Service::new("hair-colouring", "Hair Colouring", 1000, "~2 hours", "Varies by colour"),
        Service::new("perm", "Perm", 4000, "~3 hours", ""),
    ]
}

fn default_time_slots() -> Vec<TimeSlot> {
    (9..=19)
        .filter_map(|hour| TimeSlot::new(hour, 0).ok())
        .collect()
}

/// Partial update of the settings singleton. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    /// Replacement service catalog.
    pub services: Option<Vec<Service>>,
    /// Replacement default slot list.
    pub time_slots: Option<Vec<TimeSlot>>,
    /// Replacement blocked-slot map.
    pub blocked_slots: Option<BlockedSlots>,
}

impl SettingsPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.services.is_none() && self.time_slots.is_none() && self.blocked_slots.is_none()
    }

    /// Check the patch contents and normalize them.
    ///
    /// Duplicate time slots collapse (first occurrence wins) and dates whose
    /// blocked set is empty are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if a service has a blank id or
    /// label, or two services share an id.
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(services) = &self.services {
            let mut seen = BTreeSet::new();
            for service in services {
                if service.id.trim().is_empty() || service.label.trim().is_empty() {
                    return Err(BookingError::validation("service id and label are required"));
                }
                if !seen.insert(service.id.as_str()) {
                    return Err(BookingError::validation(format!(
                        "duplicate service id: {}",
                        service.id
                    )));
                }
            }
        }

        if let Some(slots) = self.time_slots.take() {
            let mut seen = BTreeSet::new();
            self.time_slots = Some(slots.into_iter().filter(|slot| seen.insert(*slot)).collect());
        }

        if let Some(blocked) = &mut self.blocked_slots {
            blocked.retain(|_, slots| !slots.is_empty());
        }

        Ok(self)
    }

    /// Merge the patch into `settings`.
    pub fn apply_to(self, settings: &mut Settings, updated_at: DateTime<Utc>) {
        if let Some(services) = self.services {
            settings.services = services;
        }
        if let Some(time_slots) = self.time_slots {
            settings.time_slots = time_slots;
        }
        if let Some(blocked_slots) = self.blocked_slots {
            settings.blocked_slots = blocked_slots;
        }
        settings.updated_at = updated_at;
    }
}

/// Engine component owning reads and administrator writes of the singleton.
#[derive(Clone)]
pub struct SettingsStore {
    repository: Arc<dyn SettingsRepository>,
    clock: Arc<dyn Clock>,
}

impl SettingsStore {
    /// Create the settings component.
    #[must_use]
    pub fn new(repository: Arc<dyn SettingsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Current settings, created with defaults on first access.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unavailable`] if the store fails.
    pub async fn get(&self) -> Result<Settings> {
        self.repository
            .get_or_create(Settings::defaults(self.clock.now()))
            .await
    }

    /// Apply a partial update on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Authorization`] if `actor` is not an administrator
    /// - [`BookingError::Validation`] if the patch is malformed
    /// - [`BookingError::Unavailable`] if the store fails
    pub async fn update(&self, patch: SettingsPatch, actor: &Actor) -> Result<Settings> {
        if !actor.is_admin() {
            tracing::warn!(user_id = %actor.user_id, role = ?actor.role, "Settings update refused");
            return Err(BookingError::Authorization(
                "only administrators may change settings".to_string(),
            ));
        }

        let patch = patch.normalized()?;
        let now = self.clock.now();
        let settings = self
            .repository
            .apply_patch(Settings::defaults(now), patch, now)
            .await?;

        tracing::info!(
            user_id = %actor.user_id,
            services = settings.services.len(),
            time_slots = settings.time_slots.len(),
            blocked_dates = settings.blocked_slots.len(),
            "Settings updated"
        );

        Ok(settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn slot(label: &str) -> TimeSlot {
        label.parse().unwrap()
    }

    #[test]
    fn defaults_cover_nine_to_seven() {
        let settings = Settings::defaults(now());
        let labels: Vec<String> = settings.time_slots.iter().map(ToString::to_string).collect();
        assert_eq!(labels.first().map(String::as_str), Some("09:00"));
        assert_eq!(labels.last().map(String::as_str), Some("19:00"));
        assert_eq!(labels.len(), 11);
        assert_eq!(settings.services.len(), 5);
        assert!(settings.blocked_slots.is_empty());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut settings = Settings::defaults(now());
        let services = settings.services.clone();
        let time_slots = settings.time_slots.clone();

        let date = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
        let blocked = BlockedSlots::from([(date, BTreeSet::from([slot("19:00"), slot("20:00")]))]);
        let later = now() + chrono::Duration::hours(1);

        SettingsPatch {
            blocked_slots: Some(blocked.clone()),
            ..SettingsPatch::default()
        }
        .apply_to(&mut settings, later);

        assert_eq!(settings.services, services);
        assert_eq!(settings.time_slots, time_slots);
        assert_eq!(settings.blocked_slots, blocked);
        assert_eq!(settings.updated_at, later);
        assert!(settings.is_blocked(date, slot("19:00")));
        assert!(!settings.is_blocked(date, slot("18:00")));
    }

    #[test]
    fn normalization_dedupes_and_drops_empty_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
        let empty = NaiveDate::from_ymd_opt(2026, 2, 26).unwrap();
        let patch = SettingsPatch {
            time_slots: Some(vec![slot("10:00"), slot("09:00"), slot("10:00")]),
            blocked_slots: Some(BlockedSlots::from([
                (date, BTreeSet::from([slot("19:00")])),
                (empty, BTreeSet::new()),
            ])),
            ..SettingsPatch::default()
        }
        .normalized()
        .unwrap();

        assert_eq!(patch.time_slots.unwrap(), vec![slot("10:00"), slot("09:00")]);
        let blocked = patch.blocked_slots.unwrap();
        assert!(blocked.contains_key(&date));
        assert!(!blocked.contains_key(&empty));
    }

    #[test]
    fn normalization_rejects_duplicate_service_ids() {
        let mut services = default_services();
        services.push(services[0].clone());
        let result = SettingsPatch {
            services: Some(services),
            ..SettingsPatch::default()
        }
        .normalized();
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn blocked_slots_wire_format() {
        let json = r#"{"blocked_slots": {"2026-02-25": ["19:00", "20:00", "19:00"]}}"#;
        let patch: SettingsPatch = serde_json::from_str(json).unwrap();
        assert!(patch.services.is_none());
        assert!(patch.time_slots.is_none());

        let blocked = patch.blocked_slots.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 2, 25).unwrap();
        assert_eq!(blocked[&date].len(), 2);

        let back = serde_json::to_value(&blocked).unwrap();
        assert_eq!(back["2026-02-25"], serde_json::json!(["19:00", "20:00"]));
    }
}
