//! In-memory store doubles for engine tests.
//!
//! Behavior mirrors the sqlite stores where the engine depends on it: the
//! customer map is keyed by canonical phone, so `insert` surfaces the same
//! duplicate-key condition the unique index does.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use garasi_core::domain::activity::ActivityKind;
use garasi_core::domain::customer::{Customer, CustomerId, PhoneNumber};
use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId, LegacyEvent, LegacyEventId};
use garasi_core::domain::vehicle::{
    BookingStatus, EntryId, OfferStatus, Vehicle, VehicleId,
};

use super::{
    AnalyticsFilter, CustomerStore, InteractionAppend, LegacyBookingStore, LegacyEventStore,
    StoreError, VehicleKindCount, VehicleStore,
};

#[derive(Default)]
pub struct InMemoryVehicleStore {
    vehicles: RwLock<HashMap<String, Vehicle>>,
}

#[async_trait::async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError> {
        let vehicles = self.vehicles.read().await;
        let mut all: Vec<Vehicle> = vehicles.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError> {
        let mut vehicles = self.vehicles.write().await;
        vehicles.insert(vehicle.id.0.clone(), vehicle);
        Ok(())
    }

    async fn append_interaction(
        &self,
        id: &VehicleId,
        entry: InteractionAppend,
    ) -> Result<(), StoreError> {
        let mut vehicles = self.vehicles.write().await;
        if let Some(vehicle) = vehicles.get_mut(&id.0) {
            match entry {
                InteractionAppend::TestDrive(entry) => {
                    vehicle.interactions.test_drives.push(entry)
                }
                InteractionAppend::CashOffer(entry) => {
                    vehicle.interactions.cash_offers.push(entry)
                }
                InteractionAppend::CreditRequest(entry) => {
                    vehicle.interactions.credit_requests.push(entry)
                }
            }
            vehicle.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_offer_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut vehicles = self.vehicles.write().await;
        let Some(vehicle) = vehicles.get_mut(&vehicle_id.0) else {
            return Ok(false);
        };
        match vehicle.interactions.cash_offers.iter_mut().find(|offer| offer.id == *entry_id) {
            Some(offer) => {
                offer.status = status;
                if notes.is_some() {
                    offer.notes = notes;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut vehicles = self.vehicles.write().await;
        let Some(vehicle) = vehicles.get_mut(&vehicle_id.0) else {
            return Ok(false);
        };
        match vehicle.interactions.test_drives.iter_mut().find(|booking| booking.id == *entry_id)
        {
            Some(booking) => {
                booking.status = status;
                if notes.is_some() {
                    booking.notes = notes;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
    ) -> Result<bool, StoreError> {
        let mut vehicles = self.vehicles.write().await;
        let Some(vehicle) = vehicles.get_mut(&vehicle_id.0) else {
            return Ok(false);
        };
        let before = vehicle.interactions.test_drives.len();
        vehicle.interactions.test_drives.retain(|booking| booking.id != *entry_id);
        Ok(vehicle.interactions.test_drives.len() < before)
    }

    async fn expire_active_bookings_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut vehicles = self.vehicles.write().await;
        let mut expired = 0u64;
        for vehicle in vehicles.values_mut() {
            for booking in &mut vehicle.interactions.test_drives {
                if booking.status == BookingStatus::Active && booking.scheduled_at < cutoff {
                    booking.status = BookingStatus::Expired;
                    expired += 1;
                }
            }
        }
        Ok(expired)
    }
}

#[derive(Default)]
pub struct InMemoryCustomerStore {
    by_phone: RwLock<HashMap<String, Customer>>,
}

#[async_trait::async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Customer>, StoreError> {
        let customers = self.by_phone.read().await;
        Ok(customers.get(&phone.0).cloned())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError> {
        let customers = self.by_phone.read().await;
        Ok(customers.values().find(|customer| customer.id == *id).cloned())
    }

    async fn insert(&self, customer: Customer) -> Result<(), StoreError> {
        let mut customers = self.by_phone.write().await;
        if customers.contains_key(&customer.phone.0) {
            return Err(StoreError::DuplicateKey(customer.phone.0.clone()));
        }
        customers.insert(customer.phone.0.clone(), customer);
        Ok(())
    }

    async fn save(&self, customer: Customer) -> Result<(), StoreError> {
        let mut customers = self.by_phone.write().await;
        customers.insert(customer.phone.0.clone(), customer);
        Ok(())
    }

    async fn list_by_last_activity(&self) -> Result<Vec<Customer>, StoreError> {
        let customers = self.by_phone.read().await;
        let mut all: Vec<Customer> = customers.values().cloned().collect();
        all.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(all)
    }
}

#[derive(Default)]
pub struct InMemoryLegacyEventStore {
    events: RwLock<Vec<LegacyEvent>>,
}

#[async_trait::async_trait]
impl LegacyEventStore for InMemoryLegacyEventStore {
    async fn insert(&self, event: LegacyEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        events.push(event);
        Ok(())
    }

    async fn list_by_kind(&self, kind: ActivityKind) -> Result<Vec<LegacyEvent>, StoreError> {
        let events = self.events.read().await;
        let mut matching: Vec<LegacyEvent> =
            events.iter().filter(|event| event.kind == kind).cloned().collect();
        matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(matching)
    }

    async fn update_offer_status(
        &self,
        id: &LegacyEventId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut events = self.events.write().await;
        let Some(event) = events
            .iter_mut()
            .find(|event| event.id == *id && event.kind == ActivityKind::CashOffer)
        else {
            return Ok(false);
        };
        if let Some(payload) = event.payload.as_object_mut() {
            payload.insert("status".to_string(), serde_json::json!(status.as_str()));
            if let Some(notes) = notes {
                payload.insert("notes".to_string(), serde_json::json!(notes));
            }
        }
        Ok(true)
    }

    async fn count_by_vehicle_and_kind(
        &self,
        filter: AnalyticsFilter,
    ) -> Result<Vec<VehicleKindCount>, StoreError> {
        let events = self.events.read().await;
        let mut counts: HashMap<(String, ActivityKind), u64> = HashMap::new();
        for event in events.iter() {
            if let Some(year) = filter.year {
                if chrono::Datelike::year(&event.occurred_at) != year {
                    continue;
                }
            }
            if let Some(month) = filter.month {
                if chrono::Datelike::month(&event.occurred_at) != month {
                    continue;
                }
            }
            if let Some(before) = filter.before {
                // Only dual-written kinds are bounded; views and purchases
                // have no embedded mirror to count from.
                if event.kind.has_embedded_mirror() && event.occurred_at >= before {
                    continue;
                }
            }
            *counts.entry((event.vehicle_id.0.clone(), event.kind)).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((vehicle_id, kind), count)| VehicleKindCount {
                vehicle_id: VehicleId(vehicle_id),
                kind,
                count,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryLegacyBookingStore {
    bookings: RwLock<HashMap<String, LegacyBooking>>,
}

#[async_trait::async_trait]
impl LegacyBookingStore for InMemoryLegacyBookingStore {
    async fn insert(&self, booking: LegacyBooking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id.0.clone(), booking);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LegacyBooking>, StoreError> {
        let bookings = self.bookings.read().await;
        let mut all: Vec<LegacyBooking> = bookings.values().cloned().collect();
        all.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(all)
    }

    async fn find_by_id(&self, id: &LegacyBookingId) -> Result<Option<LegacyBooking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id.0).cloned())
    }

    async fn update_status(
        &self,
        id: &LegacyBookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id.0) {
            Some(booking) => {
                booking.status = status;
                if notes.is_some() {
                    booking.notes = notes;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &LegacyBookingId) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.remove(&id.0).is_some())
    }

    async fn expire_active_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut bookings = self.bookings.write().await;
        let mut expired = 0u64;
        for booking in bookings.values_mut() {
            if booking.status == BookingStatus::Active && booking.scheduled_at < cutoff {
                booking.status = BookingStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use garasi_core::domain::customer::{
        Customer, CustomerId, LeadStatus, PhoneNumber, SummaryStats,
    };
    use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId};
    use garasi_core::domain::vehicle::{
        BookingStatus, CustomerSnapshot, EntryId, TestDriveEntry, Vehicle, VehicleId,
        VehicleInteractions, VehicleStatus,
    };

    use crate::stores::{
        CustomerStore, InMemoryCustomerStore, InMemoryLegacyBookingStore, InMemoryVehicleStore,
        InteractionAppend, LegacyBookingStore, StoreError, VehicleStore,
    };

    fn vehicle(id: &str) -> Vehicle {
        Vehicle {
            id: VehicleId(id.to_string()),
            name: "Toyota Avanza 2021".to_string(),
            price: Decimal::new(200_000_000, 0),
            status: VehicleStatus::Available,
            interactions: VehicleInteractions::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(phone: &str) -> Customer {
        Customer {
            id: CustomerId::generate(),
            name: "Budi Santoso".to_string(),
            phone: PhoneNumber(phone.to_string()),
            status: LeadStatus::initial(),
            last_activity: Utc::now(),
            total_interactions: 1,
            history: Vec::new(),
            summary: SummaryStats::default(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn vehicle_store_round_trip_and_append() {
        let store = InMemoryVehicleStore::default();
        store.save(vehicle("v-1")).await.expect("save vehicle");

        let entry = TestDriveEntry {
            id: EntryId::generate(),
            dedup_key: None,
            customer: CustomerSnapshot {
                name: "Budi".to_string(),
                phone: "628123456789".to_string(),
            },
            scheduled_at: Utc::now() + Duration::days(1),
            status: BookingStatus::Active,
            notes: None,
            created_at: Utc::now(),
        };
        store
            .append_interaction(&VehicleId("v-1".to_string()), InteractionAppend::TestDrive(entry))
            .await
            .expect("append");

        let found = store
            .find_by_id(&VehicleId("v-1".to_string()))
            .await
            .expect("find")
            .expect("vehicle exists");
        assert_eq!(found.interactions.test_drives.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_phone_insert_is_rejected() {
        let store = InMemoryCustomerStore::default();
        store.insert(customer("628123456789")).await.expect("first insert");

        let result = store.insert(customer("628123456789")).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(phone)) if phone == "628123456789"));
    }

    #[tokio::test]
    async fn legacy_booking_expiry_only_touches_stale_active_rows() {
        let store = InMemoryLegacyBookingStore::default();
        let now = Utc::now();

        let stale = LegacyBooking {
            id: LegacyBookingId("b-stale".to_string()),
            customer_name: "Budi".to_string(),
            phone: "08123456789".to_string(),
            vehicle_id: VehicleId("v-1".to_string()),
            scheduled_at: now - Duration::days(1),
            status: BookingStatus::Active,
            notes: None,
            created_at: now - Duration::days(2),
        };
        let upcoming = LegacyBooking {
            id: LegacyBookingId("b-upcoming".to_string()),
            scheduled_at: now + Duration::days(1),
            ..stale.clone()
        };
        store.insert(stale).await.expect("insert stale");
        store.insert(upcoming).await.expect("insert upcoming");

        assert_eq!(store.expire_active_before(now).await.expect("first sweep"), 1);
        assert_eq!(store.expire_active_before(now).await.expect("second sweep"), 0);

        let upcoming = store
            .find_by_id(&LegacyBookingId("b-upcoming".to_string()))
            .await
            .expect("find")
            .expect("row exists");
        assert_eq!(upcoming.status, BookingStatus::Active);
    }
}
