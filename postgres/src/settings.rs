//! Settings singleton row.

use crate::database_error;
use chrono::{DateTime, Utc};
use fieldbook_core::error::Result;
use fieldbook_core::repository::{SettingsRepository, StoreFuture};
use fieldbook_core::settings::{BlockedSlots, Service, Settings, SettingsPatch, SETTINGS_KEY};
use fieldbook_core::types::TimeSlot;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// `PostgreSQL` settings store, one row keyed [`SETTINGS_KEY`].
#[derive(Clone, Debug)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    /// Create a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_settings(row: &PgRow) -> Result<Settings> {
        let decode = |e: sqlx::Error| database_error("Failed to decode settings", &e);

        let Json(services): Json<Vec<Service>> = row.try_get("services").map_err(decode)?;
        let Json(time_slots): Json<Vec<TimeSlot>> = row.try_get("time_slots").map_err(decode)?;
        let Json(blocked_slots): Json<BlockedSlots> =
            row.try_get("blocked_slots").map_err(decode)?;

        Ok(Settings {
            services,
            time_slots,
            blocked_slots,
            updated_at: row.try_get("updated_at").map_err(decode)?,
        })
    }

    async fn fetch_or_create(&self, defaults: Settings) -> Result<Settings> {
        let inserted = sqlx::query(
            r"
            INSERT INTO settings (key, services, time_slots, blocked_slots, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(SETTINGS_KEY)
        .bind(Json(&defaults.services))
        .bind(Json(&defaults.time_slots))
        .bind(Json(&defaults.blocked_slots))
        .bind(defaults.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to create settings", &e))?;

        if inserted.rows_affected() > 0 {
            tracing::info!(key = SETTINGS_KEY, "Settings created with defaults");
        }

        let row = sqlx::query(
            r"
            SELECT services, time_slots, blocked_slots, updated_at
            FROM settings
            WHERE key = $1
            ",
        )
        .bind(SETTINGS_KEY)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load settings", &e))?;

        Self::row_to_settings(&row)
    }

    async fn upsert(
        &self,
        defaults: Settings,
        patch: SettingsPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Settings> {
        let services = patch.services.clone().map(Json);
        let time_slots = patch.time_slots.clone().map(Json);
        let blocked_slots = patch.blocked_slots.clone().map(Json);

        // The inserted row is the defaults with the patch already applied.
        let mut fresh = defaults;
        patch.apply_to(&mut fresh, updated_at);

        let row = sqlx::query(
            r"
            INSERT INTO settings AS existing (key, services, time_slots, blocked_slots, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key) DO UPDATE SET
                services = COALESCE($6, existing.services),
                time_slots = COALESCE($7, existing.time_slots),
                blocked_slots = COALESCE($8, existing.blocked_slots),
                updated_at = EXCLUDED.updated_at
            RETURNING services, time_slots, blocked_slots, updated_at
            ",
        )
        .bind(SETTINGS_KEY)
        .bind(Json(&fresh.services))
        .bind(Json(&fresh.time_slots))
        .bind(Json(&fresh.blocked_slots))
        .bind(updated_at)
        .bind(services)
        .bind(time_slots)
        .bind(blocked_slots)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("Failed to update settings", &e))?;

        let settings = Self::row_to_settings(&row)?;
        metrics::counter!("settings.updated").increment(1);
        Ok(settings)
    }
}

impl SettingsRepository for PostgresSettingsRepository {
    fn get_or_create(&self, defaults: Settings) -> StoreFuture<'_, Settings> {
        Box::pin(self.fetch_or_create(defaults))
    }

    fn apply_patch(
        &self,
        defaults: Settings,
        patch: SettingsPatch,
        updated_at: DateTime<Utc>,
    ) -> StoreFuture<'_, Settings> {
        Box::pin(self.upsert(defaults, patch, updated_at))
    }
}
