//! Venue catalog.
//!
//! Venues are owned by the catalog service; the engine only reads them.
//! [`PostgresVenueCatalog::register`] exists for seeding and tests.

use crate::{database_error, money_column};
use fieldbook_core::error::{BookingError, Result};
use fieldbook_core::repository::{StoreFuture, VenueCatalog};
use fieldbook_core::types::{Money, Pricing, TimeSlot, Venue, VenueId};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

/// `PostgreSQL` venue catalog.
#[derive(Clone, Debug)]
pub struct PostgresVenueCatalog {
    pool: PgPool,
}

fn price_column(row: &PgRow, column: &str) -> Result<Money> {
    let amount: i64 = row
        .try_get(column)
        .map_err(|e| database_error("Failed to decode venue", &e))?;
    u64::try_from(amount)
        .map(Money::new)
        .map_err(|_| BookingError::unavailable(format!("Venue has negative {column}: {amount}")))
}

impl PostgresVenueCatalog {
    /// Create a catalog on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_venue(row: &PgRow) -> Result<Venue> {
        let decode = |e: sqlx::Error| database_error("Failed to decode venue", &e);

        let Json(time_slots): Json<Vec<TimeSlot>> = row.try_get("time_slots").map_err(decode)?;
        let status: String = row.try_get("status").map_err(decode)?;

        Ok(Venue {
            id: VenueId::from_uuid(row.try_get("id").map_err(decode)?),
            name: row.try_get("name").map_err(decode)?,
            pricing: Pricing {
                weekday: price_column(row, "weekday_price")?,
                weekend: price_column(row, "weekend_price")?,
                night_extra: price_column(row, "night_extra")?,
            },
            time_slots,
            status: status.parse().map_err(|e: BookingError| {
                BookingError::unavailable(format!("Venue has bad status: {e}"))
            })?,
        })
    }

    /// Insert or replace a venue.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if a tariff does not fit the
    /// column, or [`BookingError::Unavailable`] if the write fails.
    pub async fn register(&self, venue: &Venue) -> Result<()> {
        let weekday_price = money_column(venue.pricing.weekday, "weekday_price")?;
        let weekend_price = money_column(venue.pricing.weekend, "weekend_price")?;
        let night_extra = money_column(venue.pricing.night_extra, "night_extra")?;

        sqlx::query(
            r"
            INSERT INTO venues (id, name, weekday_price, weekend_price, night_extra, time_slots, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                weekday_price = EXCLUDED.weekday_price,
                weekend_price = EXCLUDED.weekend_price,
                night_extra = EXCLUDED.night_extra,
                time_slots = EXCLUDED.time_slots,
                status = EXCLUDED.status
            ",
        )
        .bind(venue.id.as_uuid())
        .bind(&venue.name)
        .bind(weekday_price)
        .bind(weekend_price)
        .bind(night_extra)
        .bind(Json(&venue.time_slots))
        .bind(venue.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to register venue", &e))?;

        tracing::info!(venue_id = %venue.id, name = %venue.name, "Venue registered");
        Ok(())
    }

    async fn fetch(&self, id: VenueId) -> Result<Option<Venue>> {
        let row = sqlx::query(
            r"
            SELECT id, name, weekday_price, weekend_price, night_extra, time_slots, status
            FROM venues
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load venue", &e))?;

        row.as_ref().map(Self::row_to_venue).transpose()
    }
}

impl VenueCatalog for PostgresVenueCatalog {
    fn venue(&self, id: VenueId) -> StoreFuture<'_, Option<Venue>> {
        Box::pin(self.fetch(id))
    }
}
