//! Reservation rows.
//!
//! The slot invariant lives in the schema: a partial unique index on
//! `(venue_id, date, time) WHERE status IN ('pending', 'approved')`. Inserts go
//! through `ON CONFLICT ... DO NOTHING RETURNING`, so "check the slot" and
//! "take the slot" are one statement and no application-level lock is needed.

use crate::{database_error, money_column};
use fieldbook_core::error::{BookingError, ConflictReason, Result};
use fieldbook_core::repository::{ReservationFilter, ReservationRepository, StoreFuture};
use fieldbook_core::types::{Money, Reservation, ReservationId, ReservationStatus, UserId, VenueId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const COLUMNS: &str = "id, venue_id, user_id, customer_name, customer_surname, phone, \
                       date, time, price, status, created_at";

/// `PostgreSQL` reservation store.
#[derive(Clone, Debug)]
pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    /// Create a store on an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_reservation(row: &PgRow) -> Result<Reservation> {
        let decode = |e: sqlx::Error| database_error("Failed to decode reservation", &e);

        let time: String = row.try_get("time").map_err(decode)?;
        let status: String = row.try_get("status").map_err(decode)?;
        let price: i64 = row.try_get("price").map_err(decode)?;
        let price = u64::try_from(price).map_err(|_| {
            BookingError::unavailable(format!("Stored reservation has negative price: {price}"))
        })?;

        Ok(Reservation {
            id: ReservationId::from_uuid(row.try_get("id").map_err(decode)?),
            venue_id: VenueId::from_uuid(row.try_get("venue_id").map_err(decode)?),
            user_id: row
                .try_get::<Option<String>, _>("user_id")
                .map_err(decode)?
                .map(UserId),
            customer_name: row.try_get("customer_name").map_err(decode)?,
            customer_surname: row.try_get("customer_surname").map_err(decode)?,
            phone: row.try_get("phone").map_err(decode)?,
            date: row.try_get("date").map_err(decode)?,
            time: time.parse().map_err(|e: BookingError| {
                BookingError::unavailable(format!("Stored reservation has bad time: {e}"))
            })?,
            price: Money::new(price),
            status: status.parse().map_err(|e: BookingError| {
                BookingError::unavailable(format!("Stored reservation has bad status: {e}"))
            })?,
            created_at: row.try_get("created_at").map_err(decode)?,
        })
    }

    fn conflict(reservation: &Reservation) -> BookingError {
        metrics::counter!("reservations.conflicts").increment(1);
        BookingError::Conflict {
            venue_id: reservation.venue_id,
            date: reservation.date,
            time: reservation.time,
            reason: ConflictReason::SlotHeld,
        }
    }

    async fn insert(&self, reservation: Reservation) -> Result<Reservation> {
        let price = money_column(reservation.price, "price")?;

        let query = format!(
            r"
            INSERT INTO reservations (
                id, venue_id, user_id, customer_name, customer_surname, phone,
                date, time, price, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ON CONFLICT (venue_id, date, time) WHERE status IN ('pending', 'approved')
            DO NOTHING
            RETURNING {COLUMNS}
            "
        );

        let inserted = sqlx::query(&query)
            .bind(reservation.id.as_uuid())
            .bind(reservation.venue_id.as_uuid())
            .bind(reservation.user_id.as_ref().map(|user| user.0.as_str()))
            .bind(&reservation.customer_name)
            .bind(&reservation.customer_surname)
            .bind(&reservation.phone)
            .bind(reservation.date)
            .bind(reservation.time.to_string())
            .bind(price)
            .bind(reservation.status.as_str())
            .bind(reservation.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                // Unique violation on the active-slot index: same as DO NOTHING.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Self::conflict(&reservation);
                    }
                }
                database_error("Failed to insert reservation", &e)
            })?;

        let Some(row) = inserted else {
            return Err(Self::conflict(&reservation));
        };

        let created = Self::row_to_reservation(&row)?;
        metrics::counter!("reservations.created").increment(1);
        Ok(created)
    }

    async fn fetch(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to load reservation", &e))?;

        row.as_ref().map(Self::row_to_reservation).transpose()
    }

    async fn select(&self, filter: ReservationFilter) -> Result<Vec<Reservation>> {
        let order = "ORDER BY date ASC, time ASC, created_at ASC";
        let rows = match &filter {
            ReservationFilter::All => {
                sqlx::query(&format!("SELECT {COLUMNS} FROM reservations {order}"))
                    .fetch_all(&self.pool)
                    .await
            }
            ReservationFilter::Slot { venue_id, date } => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM reservations
                     WHERE venue_id = $1 AND date = $2 AND status IN ('pending', 'approved')
                     {order}"
                ))
                .bind(venue_id.as_uuid())
                .bind(*date)
                .fetch_all(&self.pool)
                .await
            }
            ReservationFilter::User(user_id) => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM reservations WHERE user_id = $1 {order}"
                ))
                .bind(user_id.0.as_str())
                .fetch_all(&self.pool)
                .await
            }
            ReservationFilter::Venue(venue_id) => {
                sqlx::query(&format!(
                    "SELECT {COLUMNS} FROM reservations WHERE venue_id = $1 {order}"
                ))
                .bind(venue_id.as_uuid())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| database_error("Failed to list reservations", &e))?;

        rows.iter().map(Self::row_to_reservation).collect()
    }

    async fn swap_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> Result<Option<Reservation>> {
        let query = format!(
            r"
            UPDATE reservations
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {COLUMNS}
            "
        );

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .bind(next.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to update reservation status", &e))?;

        let updated = row.as_ref().map(Self::row_to_reservation).transpose()?;
        if updated.is_some() {
            metrics::counter!(
                "reservations.status_changed",
                "from" => expected.as_str(),
                "to" => next.as_str()
            )
            .increment(1);
        }
        Ok(updated)
    }
}

impl ReservationRepository for PostgresReservationRepository {
    fn insert_if_slot_free(&self, reservation: Reservation) -> StoreFuture<'_, Reservation> {
        Box::pin(self.insert(reservation))
    }

    fn get(&self, id: ReservationId) -> StoreFuture<'_, Option<Reservation>> {
        Box::pin(self.fetch(id))
    }

    fn list(&self, filter: ReservationFilter) -> StoreFuture<'_, Vec<Reservation>> {
        Box::pin(self.select(filter))
    }

    fn compare_and_set_status(
        &self,
        id: ReservationId,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> StoreFuture<'_, Option<Reservation>> {
        Box::pin(self.swap_status(id, expected, next))
    }
}
