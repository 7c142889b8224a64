use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId};
use garasi_core::domain::vehicle::{BookingStatus, VehicleId};

use super::{LegacyBookingStore, StoreError};
use crate::stores::vehicle::datetime_from_raw;
use crate::DbPool;

pub struct SqlLegacyBookingStore {
    pool: DbPool,
}

impl SqlLegacyBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_BOOKING: &str = "SELECT id, customer_name, phone, vehicle_id, scheduled_at, \
     status, notes, created_at FROM legacy_booking";

#[async_trait::async_trait]
impl LegacyBookingStore for SqlLegacyBookingStore {
    async fn insert(&self, booking: LegacyBooking) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO legacy_booking (
                id, customer_name, phone, vehicle_id, scheduled_at, status, notes, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&booking.id.0)
        .bind(&booking.customer_name)
        .bind(&booking.phone)
        .bind(&booking.vehicle_id.0)
        .bind(booking.scheduled_at.to_rfc3339())
        .bind(booking.status.as_str())
        .bind(booking.notes.as_deref())
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LegacyBooking>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_BOOKING} ORDER BY scheduled_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(booking_from_row).collect()
    }

    async fn find_by_id(&self, id: &LegacyBookingId) -> Result<Option<LegacyBooking>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_BOOKING} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(booking_from_row).transpose()
    }

    async fn update_status(
        &self,
        id: &LegacyBookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let result = if let Some(notes) = notes {
            sqlx::query("UPDATE legacy_booking SET status = ?, notes = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(notes)
                .bind(&id.0)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query("UPDATE legacy_booking SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(&id.0)
                .execute(&self.pool)
                .await?
        };
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &LegacyBookingId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM legacy_booking WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_active_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE legacy_booking SET status = ? WHERE status = ? AND scheduled_at < ?",
        )
        .bind(BookingStatus::Expired.as_str())
        .bind(BookingStatus::Active.as_str())
        .bind(cutoff.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn booking_from_row(row: SqliteRow) -> Result<LegacyBooking, StoreError> {
    let status_raw: String = row.try_get("status")?;

    Ok(LegacyBooking {
        id: LegacyBookingId(row.try_get("id")?),
        customer_name: row.try_get("customer_name")?,
        phone: row.try_get("phone")?,
        vehicle_id: VehicleId(row.try_get("vehicle_id")?),
        scheduled_at: datetime_from_raw(row.try_get("scheduled_at")?)?,
        status: BookingStatus::parse(&status_raw)
            .ok_or_else(|| StoreError::Decode(format!("unknown booking status `{status_raw}`")))?,
        notes: row.try_get("notes")?,
        created_at: datetime_from_raw(row.try_get("created_at")?)?,
    })
}
