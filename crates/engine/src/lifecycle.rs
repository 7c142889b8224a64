//! Status transitions and the booking expiry sweep.
//!
//! Every mutation probes the embedded representation first; only when no
//! subdocument matches does it fall through to the legacy store. A miss on
//! both tiers is [`EngineError::NotReconciled`] so callers can distinguish
//! "never existed" from "partially migrated".

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use garasi_core::clock::Clock;
use garasi_core::domain::legacy::LegacyBookingId;
use garasi_core::domain::vehicle::{BookingStatus, EntryId, OfferStatus, VehicleId};
use garasi_core::errors::EngineError;

use crate::reader::RecordSource;
use crate::{store_err, EngineStores};

/// Result of one expiry sweep, split per tier for the operator log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExpirySweep {
    pub expired_embedded: u64,
    pub expired_legacy: u64,
}

impl ExpirySweep {
    pub fn total(&self) -> u64 {
        self.expired_embedded + self.expired_legacy
    }
}

pub struct LifecycleOps {
    stores: EngineStores,
    clock: Arc<dyn Clock>,
}

impl LifecycleOps {
    pub fn new(stores: EngineStores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    /// Accept or reject a cash offer by id. The id names an embedded
    /// subdocument or, failing that, a legacy event row.
    pub async fn update_cash_offer_status(
        &self,
        vehicle_id: &VehicleId,
        offer_id: &str,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<RecordSource, EngineError> {
        let matched = self
            .stores
            .vehicles
            .update_offer_entry(vehicle_id, &EntryId(offer_id.to_string()), status, notes.clone())
            .await
            .map_err(store_err)?;
        if matched {
            info!(
                event_name = "lifecycle.offer_updated",
                vehicle_id = %vehicle_id,
                offer_id,
                status = status.as_str(),
                source = "embedded",
            );
            return Ok(RecordSource::Embedded);
        }

        let matched = self
            .stores
            .legacy_events
            .update_offer_status(
                &garasi_core::domain::legacy::LegacyEventId(offer_id.to_string()),
                status,
                notes,
            )
            .await
            .map_err(store_err)?;
        if matched {
            info!(
                event_name = "lifecycle.offer_updated",
                vehicle_id = %vehicle_id,
                offer_id,
                status = status.as_str(),
                source = "legacy",
            );
            return Ok(RecordSource::Legacy);
        }

        Err(EngineError::not_reconciled("cash offer", offer_id))
    }

    /// Complete or cancel a test-drive booking by id, embedded tier first.
    pub async fn update_test_drive_status(
        &self,
        vehicle_id: &VehicleId,
        booking_id: &str,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<RecordSource, EngineError> {
        let matched = self
            .stores
            .vehicles
            .update_booking_entry(
                vehicle_id,
                &EntryId(booking_id.to_string()),
                status,
                notes.clone(),
            )
            .await
            .map_err(store_err)?;
        if matched {
            info!(
                event_name = "lifecycle.booking_updated",
                vehicle_id = %vehicle_id,
                booking_id,
                status = status.as_str(),
                source = "embedded",
            );
            return Ok(RecordSource::Embedded);
        }

        let matched = self
            .stores
            .legacy_bookings
            .update_status(&LegacyBookingId(booking_id.to_string()), status, notes)
            .await
            .map_err(store_err)?;
        if matched {
            info!(
                event_name = "lifecycle.booking_updated",
                vehicle_id = %vehicle_id,
                booking_id,
                status = status.as_str(),
                source = "legacy",
            );
            return Ok(RecordSource::Legacy);
        }

        Err(EngineError::not_reconciled("booking", booking_id))
    }

    /// Hard-remove a booking. Unlike a `cancelled` transition this drops the
    /// record from whichever tier holds it.
    pub async fn cancel_booking(
        &self,
        vehicle_id: &VehicleId,
        booking_id: &str,
    ) -> Result<RecordSource, EngineError> {
        let removed = self
            .stores
            .vehicles
            .remove_booking_entry(vehicle_id, &EntryId(booking_id.to_string()))
            .await
            .map_err(store_err)?;
        if removed {
            info!(
                event_name = "lifecycle.booking_removed",
                vehicle_id = %vehicle_id,
                booking_id,
                source = "embedded",
            );
            return Ok(RecordSource::Embedded);
        }

        let removed = self
            .stores
            .legacy_bookings
            .delete(&LegacyBookingId(booking_id.to_string()))
            .await
            .map_err(store_err)?;
        if removed {
            info!(
                event_name = "lifecycle.booking_removed",
                vehicle_id = %vehicle_id,
                booking_id,
                source = "legacy",
            );
            return Ok(RecordSource::Legacy);
        }

        Err(EngineError::not_reconciled("booking", booking_id))
    }

    /// Flip every `active` booking scheduled before now to `expired`, on
    /// both tiers. Idempotent: re-running against an already-swept store
    /// reports zero.
    pub async fn expire_stale_bookings(&self) -> Result<ExpirySweep, EngineError> {
        let cutoff = self.clock.now();

        let expired_embedded = self
            .stores
            .vehicles
            .expire_active_bookings_before(cutoff)
            .await
            .map_err(store_err)?;
        let expired_legacy = self
            .stores
            .legacy_bookings
            .expire_active_before(cutoff)
            .await
            .map_err(store_err)?;

        let sweep = ExpirySweep { expired_embedded, expired_legacy };
        info!(
            event_name = "lifecycle.expiry_sweep",
            cutoff = %cutoff.to_rfc3339(),
            expired_embedded = sweep.expired_embedded,
            expired_legacy = sweep.expired_legacy,
        );
        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use garasi_core::clock::FixedClock;
    use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId};
    use garasi_core::domain::vehicle::{
        BookingStatus, CustomerSnapshot, EntryId, OfferStatus, TestDriveEntry, Vehicle, VehicleId,
        VehicleInteractions, VehicleStatus,
    };
    use garasi_core::errors::EngineError;
    use garasi_db::stores::{
        InMemoryCustomerStore, InMemoryLegacyBookingStore, InMemoryLegacyEventStore,
        InMemoryVehicleStore,
    };

    use crate::{EngineStores, RecordSource};

    use super::LifecycleOps;

    fn stores() -> EngineStores {
        EngineStores {
            vehicles: Arc::new(InMemoryVehicleStore::default()),
            customers: Arc::new(InMemoryCustomerStore::default()),
            legacy_events: Arc::new(InMemoryLegacyEventStore::default()),
            legacy_bookings: Arc::new(InMemoryLegacyBookingStore::default()),
        }
    }

    fn ops(stores: &EngineStores) -> LifecycleOps {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        LifecycleOps::new(stores.clone(), Arc::new(FixedClock(now)))
    }

    async fn seed_vehicle(stores: &EngineStores, bookings: Vec<TestDriveEntry>) -> VehicleId {
        let vehicle_id = VehicleId("v-1".to_string());
        let mut interactions = VehicleInteractions::default();
        interactions.test_drives = bookings;
        stores
            .vehicles
            .save(Vehicle {
                id: vehicle_id.clone(),
                name: "Honda Brio 2022".to_string(),
                price: Decimal::new(180_000_000, 0),
                status: VehicleStatus::Available,
                interactions,
                created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                updated_at: Utc::now(),
            })
            .await
            .expect("seed");
        vehicle_id
    }

    fn booking(id: &str, scheduled_at: chrono::DateTime<Utc>, status: BookingStatus) -> TestDriveEntry {
        TestDriveEntry {
            id: EntryId(id.to_string()),
            dedup_key: None,
            customer: CustomerSnapshot {
                name: "Budi".to_string(),
                phone: "628123456789".to_string(),
            },
            scheduled_at,
            status,
            notes: None,
            created_at: scheduled_at - Duration::days(1),
        }
    }

    #[tokio::test]
    async fn booking_update_hits_the_embedded_tier_first() {
        let stores = stores();
        let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        let vehicle_id =
            seed_vehicle(&stores, vec![booking("entry-1", tomorrow, BookingStatus::Active)]).await;

        let source = ops(&stores)
            .update_test_drive_status(&vehicle_id, "entry-1", BookingStatus::Completed, None)
            .await
            .expect("update");
        assert_eq!(source, RecordSource::Embedded);

        let vehicle = stores.vehicles.find_by_id(&vehicle_id).await.expect("find").expect("seeded");
        assert_eq!(vehicle.interactions.test_drives[0].status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn booking_update_falls_through_to_the_legacy_store() {
        let stores = stores();
        let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle(&stores, Vec::new()).await;

        stores
            .legacy_bookings
            .insert(LegacyBooking {
                id: LegacyBookingId("legacy-1".to_string()),
                customer_name: "Siti".to_string(),
                phone: "08987654321".to_string(),
                vehicle_id: vehicle_id.clone(),
                scheduled_at: tomorrow,
                status: BookingStatus::Active,
                notes: None,
                created_at: tomorrow - Duration::days(2),
            })
            .await
            .expect("insert legacy");

        let source = ops(&stores)
            .update_test_drive_status(
                &vehicle_id,
                "legacy-1",
                BookingStatus::Cancelled,
                Some("customer no-show".to_string()),
            )
            .await
            .expect("update");
        assert_eq!(source, RecordSource::Legacy);

        let row = stores
            .legacy_bookings
            .find_by_id(&LegacyBookingId("legacy-1".to_string()))
            .await
            .expect("find")
            .expect("row kept");
        assert_eq!(row.status, BookingStatus::Cancelled);
        assert_eq!(row.notes.as_deref(), Some("customer no-show"));
    }

    #[tokio::test]
    async fn unknown_id_on_both_tiers_is_not_reconciled() {
        let stores = stores();
        let vehicle_id = seed_vehicle(&stores, Vec::new()).await;

        let error = ops(&stores)
            .update_cash_offer_status(&vehicle_id, "nope", OfferStatus::Accepted, None)
            .await
            .expect_err("no row anywhere");
        assert_eq!(error, EngineError::not_reconciled("cash offer", "nope"));
    }

    #[tokio::test]
    async fn cancel_removes_the_embedded_subdocument() {
        let stores = stores();
        let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        let vehicle_id =
            seed_vehicle(&stores, vec![booking("entry-1", tomorrow, BookingStatus::Active)]).await;

        let source = ops(&stores).cancel_booking(&vehicle_id, "entry-1").await.expect("cancel");
        assert_eq!(source, RecordSource::Embedded);

        let vehicle = stores.vehicles.find_by_id(&vehicle_id).await.expect("find").expect("seeded");
        assert!(vehicle.interactions.test_drives.is_empty());
    }

    #[tokio::test]
    async fn expiry_sweep_flips_stale_actives_once() {
        let stores = stores();
        let yesterday = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle(
            &stores,
            vec![
                booking("stale", yesterday, BookingStatus::Active),
                booking("upcoming", tomorrow, BookingStatus::Active),
                booking("done", yesterday, BookingStatus::Completed),
            ],
        )
        .await;

        stores
            .legacy_bookings
            .insert(LegacyBooking {
                id: LegacyBookingId("legacy-stale".to_string()),
                customer_name: "Siti".to_string(),
                phone: "08987654321".to_string(),
                vehicle_id,
                scheduled_at: yesterday,
                status: BookingStatus::Active,
                notes: None,
                created_at: yesterday - Duration::days(1),
            })
            .await
            .expect("insert legacy");

        let ops = ops(&stores);
        let sweep = ops.expire_stale_bookings().await.expect("sweep");
        assert_eq!(sweep.expired_embedded, 1);
        assert_eq!(sweep.expired_legacy, 1);
        assert_eq!(sweep.total(), 2);

        // Completed entries and future bookings are untouched, and a second
        // pass finds nothing left to flip.
        let again = ops.expire_stale_bookings().await.expect("sweep");
        assert_eq!(again.total(), 0);
    }
}
