//! `PostgreSQL` stores for the Fieldbook reservation engine.
//!
//! This crate implements the persistence ports of `fieldbook-core`:
//!
//! - [`PostgresReservationRepository`]: reservations, with the active-slot
//!   invariant enforced by a partial unique index
//! - [`PostgresSettingsRepository`]: the settings singleton, created and
//!   patched with `ON CONFLICT` upserts
//! - [`PostgresVenueCatalog`]: read access to the venue catalog
//!
//! All three share one connection pool. Database failures (connection loss,
//! pool timeout, decode errors) surface as [`BookingError::Unavailable`].
//!
//! # Example
//!
//! ```no_run
//! use fieldbook_postgres::{migrate, PostgresReservationRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/fieldbook").await?;
//! migrate(&pool).await?;
//! let reservations = PostgresReservationRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod reservations;
mod settings;
mod venues;

pub use reservations::PostgresReservationRepository;
pub use settings::PostgresSettingsRepository;
pub use venues::PostgresVenueCatalog;

use fieldbook_core::error::{BookingError, Result};
use fieldbook_core::types::Money;
use sqlx::PgPool;

/// Apply the embedded migrations (`venues`, `reservations`, `settings`).
///
/// # Errors
///
/// Returns [`BookingError::Unavailable`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| BookingError::unavailable(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Map a driver error to the engine's taxonomy.
pub(crate) fn database_error(context: &str, error: &sqlx::Error) -> BookingError {
    tracing::error!(error = %error, "{context}");
    BookingError::unavailable(format!("{context}: {error}"))
}

/// Convert an amount to its `BIGINT` column value.
pub(crate) fn money_column(money: Money, column: &str) -> Result<i64> {
    i64::try_from(money.amount()).map_err(|_| {
        BookingError::validation(format!("{column} {money} exceeds the storable range"))
    })
}
