//! The read path: one unified view over the embedded and legacy
//! representations of the same events.
//!
//! Embedded entries win on collision; future status transitions target them
//! first, so they are the live copy. Legacy survivors are tagged with their
//! source. Storage ids differ between the two copies of one event, so dedup
//! runs on stable business fields (and on the stamped key where both sides
//! carry one), never on ids.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use garasi_core::clock::Clock;
use garasi_core::config::AnalyticsConfig;
use garasi_core::domain::activity::ActivityKind;
use garasi_core::domain::vehicle::{BookingStatus, OfferStatus, VehicleId};
use garasi_core::errors::EngineError;
use garasi_core::policy::dedup::{booking_dedup_key, offer_dedup_key};
use garasi_core::policy::phone::normalize_phone;
use garasi_db::stores::AnalyticsFilter;

use crate::{store_err, EngineStores};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Embedded,
    Legacy,
}

#[derive(Clone, Debug, Serialize)]
pub struct VehicleRef {
    pub id: VehicleId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConsolidatedBooking {
    pub id: String,
    pub customer_name: String,
    /// Canonical `62…` form.
    pub phone: String,
    pub vehicle: VehicleRef,
    pub scheduled_at: DateTime<Utc>,
    /// Effective status: `active` bookings already past the expiry threshold
    /// read as `expired` even before the sweep has flipped the stored row.
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub source: RecordSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConsolidatedOffer {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub vehicle: VehicleRef,
    pub offered_price: Decimal,
    pub list_price: Option<Decimal>,
    pub discount_pct: Option<Decimal>,
    pub status: OfferStatus,
    pub notes: Option<String>,
    pub source: RecordSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct VehicleAnalytics {
    pub vehicle_id: VehicleId,
    pub name: String,
    pub views: u64,
    pub credit_requests: u64,
    pub test_drives: u64,
    pub cash_offers: u64,
    pub total: u64,
}

pub struct ConsolidationReader {
    stores: EngineStores,
    analytics: AnalyticsConfig,
    clock: Arc<dyn Clock>,
}

impl ConsolidationReader {
    pub fn new(stores: EngineStores, analytics: AnalyticsConfig, clock: Arc<dyn Clock>) -> Self {
        Self { stores, analytics, clock }
    }

    /// Unified test-drive list: embedded entries first, then legacy rows not
    /// already represented, time-descending.
    pub async fn list_test_drive_bookings(&self) -> Result<Vec<ConsolidatedBooking>, EngineError> {
        let now = self.clock.now();
        let vehicles = self.stores.vehicles.list_all().await.map_err(store_err)?;

        let mut merged: Vec<ConsolidatedBooking> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for vehicle in &vehicles {
            for entry in &vehicle.interactions.test_drives {
                seen.insert(booking_dedup_key(&entry.customer.phone, &vehicle.id, entry.scheduled_at));
                if let Some(key) = &entry.dedup_key {
                    seen.insert(key.clone());
                }
                merged.push(ConsolidatedBooking {
                    id: entry.id.0.clone(),
                    customer_name: entry.customer.name.clone(),
                    phone: normalize_phone(&entry.customer.phone),
                    vehicle: VehicleRef { id: vehicle.id.clone(), name: vehicle.name.clone() },
                    scheduled_at: entry.scheduled_at,
                    status: effective_booking_status(entry.status, entry.scheduled_at, now),
                    notes: entry.notes.clone(),
                    source: RecordSource::Embedded,
                    created_at: entry.created_at,
                });
            }
        }

        let vehicle_names: HashMap<&str, &str> =
            vehicles.iter().map(|v| (v.id.0.as_str(), v.name.as_str())).collect();

        for booking in self.stores.legacy_bookings.list_all().await.map_err(store_err)? {
            let key = booking_dedup_key(&booking.phone, &booking.vehicle_id, booking.scheduled_at);
            if !seen.insert(key) {
                continue;
            }
            let name = vehicle_names
                .get(booking.vehicle_id.0.as_str())
                .map(|name| (*name).to_string())
                .unwrap_or_else(|| booking.vehicle_id.0.clone());
            merged.push(ConsolidatedBooking {
                id: booking.id.0.clone(),
                customer_name: booking.customer_name.clone(),
                phone: normalize_phone(&booking.phone),
                vehicle: VehicleRef { id: booking.vehicle_id.clone(), name },
                scheduled_at: booking.scheduled_at,
                status: effective_booking_status(booking.status, booking.scheduled_at, now),
                notes: booking.notes.clone(),
                source: RecordSource::Legacy,
                created_at: booking.created_at,
            });
        }

        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(merged)
    }

    /// Unified cash-offer list, same merge shape keyed on
    /// phone + vehicle + offered amount (or the stamped key when both copies
    /// carry it).
    pub async fn list_cash_offers(&self) -> Result<Vec<ConsolidatedOffer>, EngineError> {
        let vehicles = self.stores.vehicles.list_all().await.map_err(store_err)?;

        let mut merged: Vec<ConsolidatedOffer> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for vehicle in &vehicles {
            for entry in &vehicle.interactions.cash_offers {
                seen.insert(offer_dedup_key(&entry.customer.phone, &vehicle.id, entry.offered_price));
                if let Some(key) = &entry.dedup_key {
                    seen.insert(key.clone());
                }
                merged.push(ConsolidatedOffer {
                    id: entry.id.0.clone(),
                    customer_name: entry.customer.name.clone(),
                    phone: normalize_phone(&entry.customer.phone),
                    vehicle: VehicleRef { id: vehicle.id.clone(), name: vehicle.name.clone() },
                    offered_price: entry.offered_price,
                    list_price: Some(entry.list_price),
                    discount_pct: Some(entry.discount_pct),
                    status: entry.status,
                    notes: entry.notes.clone(),
                    source: RecordSource::Embedded,
                    created_at: entry.created_at,
                });
            }
        }

        let vehicle_names: HashMap<&str, &str> =
            vehicles.iter().map(|v| (v.id.0.as_str(), v.name.as_str())).collect();

        let events = self
            .stores
            .legacy_events
            .list_by_kind(ActivityKind::CashOffer)
            .await
            .map_err(store_err)?;
        for event in events {
            let Some(payload) = event.offer_payload() else {
                warn!(
                    event_name = "reader.legacy_offer_undecodable",
                    legacy_event_id = %event.id.0,
                    "skipping legacy offer with undecodable payload"
                );
                continue;
            };
            // Key on the stamped value when present; otherwise fall back to
            // the composite, or to the row id when the payload carries no
            // amount to build one from.
            let key = event.dedup_key.clone().unwrap_or_else(|| match payload.offered_price {
                Some(amount) => offer_dedup_key(&payload.phone, &event.vehicle_id, amount),
                None => format!("legacy-event:{}", event.id.0),
            });
            if seen.contains(&key) {
                continue;
            }
            if let Some(amount) = payload.offered_price {
                let composite = offer_dedup_key(&payload.phone, &event.vehicle_id, amount);
                if !seen.insert(composite) {
                    continue;
                }
            }
            seen.insert(key);

            let name = vehicle_names
                .get(event.vehicle_id.0.as_str())
                .map(|name| (*name).to_string())
                .unwrap_or_else(|| event.vehicle_id.0.clone());
            merged.push(ConsolidatedOffer {
                id: event.id.0.clone(),
                customer_name: payload.customer_name.clone(),
                phone: normalize_phone(&payload.phone),
                vehicle: VehicleRef { id: event.vehicle_id.clone(), name },
                offered_price: payload.offered_price.unwrap_or_default(),
                list_price: payload.list_price,
                discount_pct: discount_pct(payload.list_price, payload.offered_price),
                status: payload.status.unwrap_or(OfferStatus::Pending),
                notes: payload.notes.clone(),
                source: RecordSource::Legacy,
                created_at: event.occurred_at,
            });
        }

        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(merged)
    }

    /// Per-vehicle interaction counts: embedded list lengths summed with the
    /// legacy aggregation.
    ///
    /// The two sides are summed, not deduplicated; dual-written events exist
    /// in both. `analytics.legacy_cutover` bounds the legacy side of those
    /// kinds to pre-dual-write history to keep the sum honest. Views and
    /// purchases have no embedded mirror, so they always count from the
    /// legacy side regardless of the cutover.
    pub async fn vehicle_analytics(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<VehicleAnalytics>, EngineError> {
        let vehicles = self.stores.vehicles.list_all().await.map_err(store_err)?;

        let mut per_vehicle: HashMap<String, VehicleAnalytics> = HashMap::new();
        for vehicle in &vehicles {
            let mut analytics = VehicleAnalytics {
                vehicle_id: vehicle.id.clone(),
                name: vehicle.name.clone(),
                ..Default::default()
            };
            analytics.test_drives = vehicle
                .interactions
                .test_drives
                .iter()
                .filter(|entry| in_period(entry.created_at, year, month))
                .count() as u64;
            analytics.cash_offers = vehicle
                .interactions
                .cash_offers
                .iter()
                .filter(|entry| in_period(entry.created_at, year, month))
                .count() as u64;
            analytics.credit_requests = vehicle
                .interactions
                .credit_requests
                .iter()
                .filter(|entry| in_period(entry.created_at, year, month))
                .count() as u64;
            per_vehicle.insert(vehicle.id.0.clone(), analytics);
        }

        let filter = AnalyticsFilter { year, month, before: self.analytics.legacy_cutover };
        let legacy_counts = self
            .stores
            .legacy_events
            .count_by_vehicle_and_kind(filter)
            .await
            .map_err(store_err)?;
        for count in legacy_counts {
            let Some(analytics) = per_vehicle.get_mut(&count.vehicle_id.0) else {
                continue;
            };
            match count.kind {
                ActivityKind::ViewDetail => analytics.views += count.count,
                ActivityKind::CreditSimulation => analytics.credit_requests += count.count,
                ActivityKind::TestDrive => analytics.test_drives += count.count,
                ActivityKind::CashOffer => analytics.cash_offers += count.count,
                ActivityKind::Purchase => {}
            }
        }

        let mut merged: Vec<VehicleAnalytics> = per_vehicle
            .into_values()
            .map(|mut analytics| {
                analytics.total = analytics.views
                    + analytics.credit_requests
                    + analytics.test_drives
                    + analytics.cash_offers;
                analytics
            })
            .collect();
        merged.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.vehicle_id.0.cmp(&b.vehicle_id.0)));
        Ok(merged)
    }
}

fn effective_booking_status(
    stored: BookingStatus,
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> BookingStatus {
    if stored == BookingStatus::Active && scheduled_at < now {
        BookingStatus::Expired
    } else {
        stored
    }
}

fn discount_pct(list_price: Option<Decimal>, offered_price: Option<Decimal>) -> Option<Decimal> {
    let (list, offered) = (list_price?, offered_price?);
    if list <= Decimal::ZERO {
        return None;
    }
    Some(((list - offered) / list * Decimal::ONE_HUNDRED).round_dp(2))
}

fn in_period(at: DateTime<Utc>, year: Option<i32>, month: Option<u32>) -> bool {
    if let Some(year) = year {
        if at.year() != year {
            return false;
        }
    }
    if let Some(month) = month {
        if at.month() != month {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use garasi_core::clock::FixedClock;
    use garasi_core::config::AnalyticsConfig;
    use garasi_core::domain::activity::ActivityKind;
    use garasi_core::domain::customer::CustomerId;
    use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId, LegacyEvent, LegacyEventId};
    use garasi_core::domain::vehicle::{
        BookingStatus, CustomerSnapshot, EntryId, TestDriveEntry, Vehicle, VehicleId,
        VehicleInteractions, VehicleStatus,
    };
    use garasi_db::stores::{
        InMemoryCustomerStore, InMemoryLegacyBookingStore, InMemoryLegacyEventStore,
        InMemoryVehicleStore,
    };

    use crate::{EngineStores, RecordSource};

    use super::ConsolidationReader;

    fn stores() -> EngineStores {
        EngineStores {
            vehicles: Arc::new(InMemoryVehicleStore::default()),
            customers: Arc::new(InMemoryCustomerStore::default()),
            legacy_events: Arc::new(InMemoryLegacyEventStore::default()),
            legacy_bookings: Arc::new(InMemoryLegacyBookingStore::default()),
        }
    }

    fn reader(stores: &EngineStores) -> ConsolidationReader {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        ConsolidationReader::new(stores.clone(), AnalyticsConfig::default(), Arc::new(FixedClock(now)))
    }

    async fn seed_vehicle_with_booking(
        stores: &EngineStores,
        scheduled_at: chrono::DateTime<Utc>,
        status: BookingStatus,
    ) -> VehicleId {
        let vehicle_id = VehicleId("v-1".to_string());
        let mut interactions = VehicleInteractions::default();
        interactions.test_drives.push(TestDriveEntry {
            id: EntryId("entry-1".to_string()),
            dedup_key: None,
            customer: CustomerSnapshot {
                name: "Budi".to_string(),
                phone: "628123456789".to_string(),
            },
            scheduled_at,
            status,
            notes: None,
            created_at: scheduled_at - Duration::days(1),
        });
        stores
            .vehicles
            .save(Vehicle {
                id: vehicle_id.clone(),
                name: "Toyota Avanza 2021".to_string(),
                price: Decimal::new(200_000_000, 0),
                status: VehicleStatus::Available,
                interactions,
                created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                updated_at: Utc::now(),
            })
            .await
            .expect("seed");
        vehicle_id
    }

    #[tokio::test]
    async fn booking_present_in_both_stores_lists_once_from_embedded() {
        let stores = stores();
        let scheduled = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle_with_booking(&stores, scheduled, BookingStatus::Active).await;

        // Same phone (different format), same vehicle, same day, different
        // hour: one logical booking seen through both representations.
        stores
            .legacy_bookings
            .insert(LegacyBooking {
                id: LegacyBookingId("legacy-1".to_string()),
                customer_name: "Budi".to_string(),
                phone: "08123456789".to_string(),
                vehicle_id: vehicle_id.clone(),
                scheduled_at: scheduled + Duration::hours(4),
                status: BookingStatus::Active,
                notes: None,
                created_at: scheduled - Duration::days(2),
            })
            .await
            .expect("insert legacy");

        let bookings = reader(&stores).list_test_drive_bookings().await.expect("list");
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].source, RecordSource::Embedded);
        assert_eq!(bookings[0].id, "entry-1");
    }

    #[tokio::test]
    async fn legacy_only_booking_survives_tagged_legacy() {
        let stores = stores();
        let scheduled = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle_with_booking(&stores, scheduled, BookingStatus::Active).await;

        stores
            .legacy_bookings
            .insert(LegacyBooking {
                id: LegacyBookingId("legacy-2".to_string()),
                customer_name: "Siti".to_string(),
                phone: "08987654321".to_string(),
                vehicle_id,
                scheduled_at: scheduled + Duration::days(3),
                status: BookingStatus::Active,
                notes: None,
                created_at: scheduled,
            })
            .await
            .expect("insert legacy");

        let bookings = reader(&stores).list_test_drive_bookings().await.expect("list");
        assert_eq!(bookings.len(), 2);
        let legacy = bookings.iter().find(|b| b.id == "legacy-2").expect("legacy row listed");
        assert_eq!(legacy.source, RecordSource::Legacy);
        assert_eq!(legacy.phone, "62987654321");
        // Joined vehicle name comes from the vehicle store.
        assert_eq!(legacy.vehicle.name, "Toyota Avanza 2021");
    }

    #[tokio::test]
    async fn stale_active_booking_reads_as_expired_before_any_sweep() {
        let stores = stores();
        // Reader clock is 2025-06-02 12:00; booking was yesterday.
        let yesterday = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        seed_vehicle_with_booking(&stores, yesterday, BookingStatus::Active).await;

        let bookings = reader(&stores).list_test_drive_bookings().await.expect("list");
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, BookingStatus::Expired);
    }

    #[tokio::test]
    async fn offers_dedup_on_composite_key_and_sort_descending() {
        let stores = stores();
        let vehicle_id = VehicleId("v-1".to_string());
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

        let mut interactions = VehicleInteractions::default();
        interactions.cash_offers.push(garasi_core::domain::vehicle::CashOfferEntry {
            id: EntryId("offer-1".to_string()),
            dedup_key: None,
            customer: CustomerSnapshot {
                name: "Budi".to_string(),
                phone: "628123456789".to_string(),
            },
            offered_price: Decimal::new(185_000_000, 0),
            list_price: Decimal::new(200_000_000, 0),
            discount_amount: Decimal::new(15_000_000, 0),
            discount_pct: Decimal::new(750, 2),
            status: garasi_core::domain::vehicle::OfferStatus::Pending,
            notes: None,
            created_at: base,
        });
        stores
            .vehicles
            .save(Vehicle {
                id: vehicle_id.clone(),
                name: "Toyota Avanza 2021".to_string(),
                price: Decimal::new(200_000_000, 0),
                status: VehicleStatus::Available,
                interactions,
                created_at: base,
                updated_at: base,
            })
            .await
            .expect("seed");

        // Mirror of the same offer plus one genuinely legacy-only offer.
        for (id, phone, amount, at) in [
            ("e-mirror", "08123456789", 185_000_000i64, base + Duration::hours(1)),
            ("e-old", "08555555555", 190_000_000, base + Duration::days(1)),
        ] {
            stores
                .legacy_events
                .insert(LegacyEvent {
                    id: LegacyEventId(id.to_string()),
                    customer_id: CustomerId("c-1".to_string()),
                    vehicle_id: vehicle_id.clone(),
                    kind: ActivityKind::CashOffer,
                    payload: json!({
                        "customer_name": "Penawar",
                        "phone": phone,
                        "offered_price": amount,
                        "status": "pending",
                    }),
                    dedup_key: None,
                    occurred_at: at,
                })
                .await
                .expect("insert event");
        }

        let offers = reader(&stores).list_cash_offers().await.expect("list");
        assert_eq!(offers.len(), 2);
        // Newest first: the legacy-only offer was made a day later.
        assert_eq!(offers[0].id, "e-old");
        assert_eq!(offers[0].source, RecordSource::Legacy);
        assert_eq!(offers[0].discount_pct, None);
        assert_eq!(offers[1].id, "offer-1");
        assert_eq!(offers[1].source, RecordSource::Embedded);
    }

    #[tokio::test]
    async fn analytics_sums_embedded_and_legacy_counts() {
        let stores = stores();
        let scheduled = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle_with_booking(&stores, scheduled, BookingStatus::Active).await;

        for (id, kind) in [
            ("e-1", ActivityKind::ViewDetail),
            ("e-2", ActivityKind::ViewDetail),
            ("e-3", ActivityKind::TestDrive),
        ] {
            stores
                .legacy_events
                .insert(LegacyEvent {
                    id: LegacyEventId(id.to_string()),
                    customer_id: CustomerId("c-1".to_string()),
                    vehicle_id: vehicle_id.clone(),
                    kind,
                    payload: json!({}),
                    dedup_key: None,
                    occurred_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
                })
                .await
                .expect("insert event");
        }

        let analytics = reader(&stores).vehicle_analytics(Some(2025), Some(6)).await.expect("analytics");
        assert_eq!(analytics.len(), 1);
        assert_eq!(analytics[0].views, 2);
        // One embedded entry plus one legacy event: summed, not deduplicated.
        assert_eq!(analytics[0].test_drives, 2);
        assert_eq!(analytics[0].total, 4);

        // Outside the requested month nothing counts.
        let empty = reader(&stores).vehicle_analytics(Some(2025), Some(1)).await.expect("analytics");
        assert_eq!(empty[0].total, 0);
    }

    #[tokio::test]
    async fn legacy_cutover_bounds_the_legacy_side_of_analytics() {
        let stores = stores();
        let scheduled = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle_with_booking(&stores, scheduled, BookingStatus::Active).await;

        // One pre-cutover and one post-cutover legacy event.
        for (id, at) in [
            ("e-before", Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()),
            ("e-after", Utc.with_ymd_and_hms(2025, 6, 20, 8, 0, 0).unwrap()),
        ] {
            stores
                .legacy_events
                .insert(LegacyEvent {
                    id: LegacyEventId(id.to_string()),
                    customer_id: CustomerId("c-1".to_string()),
                    vehicle_id: vehicle_id.clone(),
                    kind: ActivityKind::TestDrive,
                    payload: json!({}),
                    dedup_key: None,
                    occurred_at: at,
                })
                .await
                .expect("insert event");
        }

        let cutover = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
        let reader = ConsolidationReader::new(
            stores.clone(),
            AnalyticsConfig { legacy_cutover: Some(cutover) },
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap())),
        );

        let analytics = reader.vehicle_analytics(Some(2025), Some(6)).await.expect("analytics");
        // Embedded entry + only the pre-cutover legacy event.
        assert_eq!(analytics[0].test_drives, 2);
    }

    #[tokio::test]
    async fn views_count_past_the_cutover_because_they_have_no_mirror() {
        let stores = stores();
        let scheduled = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let vehicle_id = seed_vehicle_with_booking(&stores, scheduled, BookingStatus::Active).await;

        // Views live only in the legacy log, one on each side of the cutover.
        for (id, at) in [
            ("v-before", Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()),
            ("v-after", Utc.with_ymd_and_hms(2025, 6, 20, 8, 0, 0).unwrap()),
        ] {
            stores
                .legacy_events
                .insert(LegacyEvent {
                    id: LegacyEventId(id.to_string()),
                    customer_id: CustomerId("c-1".to_string()),
                    vehicle_id: vehicle_id.clone(),
                    kind: ActivityKind::ViewDetail,
                    payload: json!({}),
                    dedup_key: None,
                    occurred_at: at,
                })
                .await
                .expect("insert event");
        }

        let cutover = Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap();
        let reader = ConsolidationReader::new(
            stores.clone(),
            AnalyticsConfig { legacy_cutover: Some(cutover) },
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap())),
        );

        let analytics = reader.vehicle_analytics(Some(2025), Some(6)).await.expect("analytics");
        assert_eq!(analytics[0].views, 2);
    }
}
