use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use garasi_core::domain::vehicle::{
    BookingStatus, EntryId, OfferStatus, Vehicle, VehicleId, VehicleInteractions, VehicleStatus,
};

use super::{InteractionAppend, StoreError, VehicleStore};
use crate::DbPool;

pub struct SqlVehicleStore {
    pool: DbPool,
}

impl SqlVehicleStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_VEHICLE: &str =
    "SELECT id, name, price, status, interactions, created_at, updated_at FROM vehicle";

#[async_trait::async_trait]
impl VehicleStore for SqlVehicleStore {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_VEHICLE} WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(vehicle_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_VEHICLE} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(vehicle_from_row).collect()
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError> {
        let interactions = serde_json::to_string(&vehicle.interactions)
            .map_err(|error| StoreError::Decode(error.to_string()))?;
        sqlx::query(
            "INSERT INTO vehicle (id, name, price, status, interactions, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                status = excluded.status,
                interactions = excluded.interactions,
                updated_at = excluded.updated_at",
        )
        .bind(&vehicle.id.0)
        .bind(&vehicle.name)
        .bind(vehicle.price.to_string())
        .bind(vehicle.status.as_str())
        .bind(interactions)
        .bind(vehicle.created_at.to_rfc3339())
        .bind(vehicle.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_interaction(
        &self,
        id: &VehicleId,
        entry: InteractionAppend,
    ) -> Result<(), StoreError> {
        let (list_path, entry_json) = match &entry {
            InteractionAppend::TestDrive(entry) => (
                "$.test_drives[#]",
                serde_json::to_string(entry).map_err(|e| StoreError::Decode(e.to_string()))?,
            ),
            InteractionAppend::CashOffer(entry) => (
                "$.cash_offers[#]",
                serde_json::to_string(entry).map_err(|e| StoreError::Decode(e.to_string()))?,
            ),
            InteractionAppend::CreditRequest(entry) => (
                "$.credit_requests[#]",
                serde_json::to_string(entry).map_err(|e| StoreError::Decode(e.to_string()))?,
            ),
        };

        // One UPDATE so the list append stays atomic under concurrent writers.
        sqlx::query(
            "UPDATE vehicle
             SET interactions = json_insert(interactions, ?, json(?)), updated_at = ?
             WHERE id = ?",
        )
        .bind(list_path)
        .bind(entry_json)
        .bind(Utc::now().to_rfc3339())
        .bind(&id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_offer_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        self.mutate_interactions(vehicle_id, |interactions| {
            match interactions.cash_offers.iter_mut().find(|offer| offer.id == *entry_id) {
                Some(offer) => {
                    offer.status = status;
                    if notes.is_some() {
                        offer.notes = notes.clone();
                    }
                    true
                }
                None => false,
            }
        })
        .await
    }

    async fn update_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        self.mutate_interactions(vehicle_id, |interactions| {
            match interactions.test_drives.iter_mut().find(|booking| booking.id == *entry_id) {
                Some(booking) => {
                    booking.status = status;
                    if notes.is_some() {
                        booking.notes = notes.clone();
                    }
                    true
                }
                None => false,
            }
        })
        .await
    }

    async fn remove_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
    ) -> Result<bool, StoreError> {
        self.mutate_interactions(vehicle_id, |interactions| {
            let before = interactions.test_drives.len();
            interactions.test_drives.retain(|booking| booking.id != *entry_id);
            interactions.test_drives.len() < before
        })
        .await
    }

    async fn expire_active_bookings_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query("SELECT id, interactions FROM vehicle")
            .fetch_all(&mut *tx)
            .await?;

        let mut expired = 0u64;
        for row in rows {
            let id: String = row.try_get("id")?;
            let mut interactions = interactions_from_raw(row.try_get("interactions")?)?;
            let mut changed = 0u64;
            for booking in &mut interactions.test_drives {
                if booking.status == BookingStatus::Active && booking.scheduled_at < cutoff {
                    booking.status = BookingStatus::Expired;
                    changed += 1;
                }
            }
            if changed > 0 {
                let encoded = serde_json::to_string(&interactions)
                    .map_err(|error| StoreError::Decode(error.to_string()))?;
                sqlx::query("UPDATE vehicle SET interactions = ?, updated_at = ? WHERE id = ?")
                    .bind(encoded)
                    .bind(Utc::now().to_rfc3339())
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
                expired += changed;
            }
        }

        tx.commit().await?;
        Ok(expired)
    }
}

impl SqlVehicleStore {
    /// Positional entry mutation inside one transaction: read the embedded
    /// lists, apply `apply`, write back only when something matched.
    async fn mutate_interactions<F>(
        &self,
        vehicle_id: &VehicleId,
        mut apply: F,
    ) -> Result<bool, StoreError>
    where
        F: FnMut(&mut VehicleInteractions) -> bool + Send,
    {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT interactions FROM vehicle WHERE id = ?")
            .bind(&vehicle_id.0)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(false);
        };

        let mut interactions = interactions_from_raw(row.try_get("interactions")?)?;
        if !apply(&mut interactions) {
            tx.commit().await?;
            return Ok(false);
        }

        let encoded = serde_json::to_string(&interactions)
            .map_err(|error| StoreError::Decode(error.to_string()))?;
        sqlx::query("UPDATE vehicle SET interactions = ?, updated_at = ? WHERE id = ?")
            .bind(encoded)
            .bind(Utc::now().to_rfc3339())
            .bind(&vehicle_id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

fn interactions_from_raw(raw: String) -> Result<VehicleInteractions, StoreError> {
    serde_json::from_str(&raw).map_err(|error| StoreError::Decode(error.to_string()))
}

fn vehicle_from_row(row: SqliteRow) -> Result<Vehicle, StoreError> {
    let price_raw: String = row.try_get("price")?;
    let status_raw: String = row.try_get("status")?;

    Ok(Vehicle {
        id: VehicleId(row.try_get("id")?),
        name: row.try_get("name")?,
        price: Decimal::from_str(&price_raw)
            .map_err(|error| StoreError::Decode(format!("bad price `{price_raw}`: {error}")))?,
        status: VehicleStatus::parse(&status_raw)
            .ok_or_else(|| StoreError::Decode(format!("unknown vehicle status `{status_raw}`")))?,
        interactions: interactions_from_raw(row.try_get("interactions")?)?,
        created_at: datetime_from_raw(row.try_get("created_at")?)?,
        updated_at: datetime_from_raw(row.try_get("updated_at")?)?,
    })
}

pub(crate) fn datetime_from_raw(raw: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| StoreError::Decode(format!("bad timestamp `{raw}`: {error}")))
}
