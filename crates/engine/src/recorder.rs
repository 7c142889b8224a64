//! The write path: validate, upsert the customer profile, then mirror the
//! activity into the embedded vehicle list and the legacy event log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use garasi_core::clock::Clock;
use garasi_core::config::PolicyConfig;
use garasi_core::domain::activity::ActivityDetails;
use garasi_core::domain::customer::{
    Customer, CustomerId, InteractionEntry, LeadStatus, PhoneNumber, SummaryStats,
    VehicleSnapshot,
};
use garasi_core::domain::legacy::{LegacyEvent, LegacyEventId};
use garasi_core::domain::vehicle::{
    BookingStatus, CashOfferEntry, CreditRequestEntry, CustomerSnapshot, EntryId, OfferStatus,
    TestDriveEntry, Vehicle, VehicleId,
};
use garasi_core::errors::EngineError;
use garasi_core::policy::dedup::stamped_dedup_key;
use garasi_core::policy::lifecycle::lifecycle_step;
use garasi_core::policy::offer::{validate_cash_offer, OfferValidation};
use garasi_core::policy::phone::normalize_phone;
use garasi_core::policy::scoring::engagement_score;
use garasi_db::stores::{InteractionAppend, StoreError};

use crate::{store_err, EngineStores};

/// An incoming activity as the thin HTTP handlers hand it over.
#[derive(Clone, Debug)]
pub struct NewActivity {
    pub customer_name: String,
    pub raw_phone: String,
    pub vehicle_id: VehicleId,
    pub details: ActivityDetails,
}

/// Result of a recording attempt.
///
/// A cash offer below the discount floor comes back as `Rejected` with the
/// full validation so the caller can show the minimum acceptable price; it is
/// not an error, and by that point no store has been touched.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Recorded(RecordedActivity),
    Rejected(OfferValidation),
}

#[derive(Clone, Debug, Serialize)]
pub struct RecordedActivity {
    pub customer_id: CustomerId,
    pub status: LeadStatus,
    pub engagement_score: u8,
    /// Present for cash offers that passed the discount gate.
    pub validation: Option<OfferValidation>,
}

pub struct ActivityRecorder {
    stores: EngineStores,
    policy: PolicyConfig,
    clock: Arc<dyn Clock>,
}

impl ActivityRecorder {
    pub fn new(stores: EngineStores, policy: PolicyConfig, clock: Arc<dyn Clock>) -> Self {
        Self { stores, policy, clock }
    }

    pub async fn record(&self, activity: NewActivity) -> Result<RecordOutcome, EngineError> {
        let phone = PhoneNumber(normalize_phone(&activity.raw_phone));
        let kind = activity.details.kind();
        let now = self.clock.now();

        let vehicle = self
            .stores
            .vehicles
            .find_by_id(&activity.vehicle_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| EngineError::VehicleNotFound(activity.vehicle_id.clone()))?;

        // Discount gate before any store mutation. An invalid offer must not
        // appear anywhere, not even as `pending`.
        let validation = match &activity.details {
            ActivityDetails::CashOffer { offered_price, .. } => {
                if *offered_price <= Decimal::ZERO {
                    return Err(EngineError::InvalidInput(
                        "offered price must be positive".to_string(),
                    ));
                }
                let validation =
                    validate_cash_offer(vehicle.price, *offered_price, self.policy.max_discount_pct);
                if !validation.is_valid {
                    info!(
                        event_name = "activity.offer_rejected",
                        vehicle_id = %vehicle.id,
                        phone = %phone,
                        discount_pct = %validation.discount_pct,
                        "cash offer below discount floor, nothing recorded"
                    );
                    return Ok(RecordOutcome::Rejected(validation));
                }
                Some(validation)
            }
            _ => None,
        };

        let mut customer = self.upsert_customer(&phone, &activity.customer_name, now).await?;

        customer.name = activity.customer_name.clone();
        customer.last_activity = now;
        customer.total_interactions += 1;

        let step = lifecycle_step(kind, customer.status);
        if step.should_update {
            info!(
                event_name = "customer.status_advanced",
                customer_id = %customer.id,
                from = customer.status.label(),
                to = step.new_status.label(),
                activity = kind.as_str(),
                "lifecycle advanced"
            );
            customer.status = step.new_status;
        }

        customer.history.push(InteractionEntry {
            vehicle: VehicleSnapshot {
                id: vehicle.id.clone(),
                name: vehicle.name.clone(),
                price: vehicle.price,
            },
            kind,
            details: activity.details.clone(),
            occurred_at: now,
        });
        customer.summary = SummaryStats::recompute(&customer.history);

        self.stores.customers.save(customer.clone()).await.map_err(store_err)?;

        // Steps below mirror the activity into the other two stores. Their
        // failure leaves the authoritative profile intact, so it is logged
        // and swallowed rather than rolled back.
        let dedup_key = stamped_dedup_key(&phone.0, &vehicle.id, now);
        self.mirror_embedded(&activity, &customer, &vehicle, validation.as_ref(), &dedup_key, now)
            .await;
        self.mirror_legacy(&activity, &customer, &vehicle, validation.as_ref(), &dedup_key, now)
            .await;

        let score = engagement_score(&customer.history);
        info!(
            event_name = "activity.recorded",
            customer_id = %customer.id,
            vehicle_id = %vehicle.id,
            activity = kind.as_str(),
            status = customer.status.label(),
            engagement_score = score,
            "activity recorded"
        );

        Ok(RecordOutcome::Recorded(RecordedActivity {
            customer_id: customer.id,
            status: customer.status,
            engagement_score: score,
            validation,
        }))
    }

    /// Upsert keyed on the canonical phone. Two concurrent first activities
    /// from one number race on `insert`; the loser sees the store's
    /// duplicate-key condition and retries as an update against the
    /// now-existing row.
    async fn upsert_customer(
        &self,
        phone: &PhoneNumber,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Customer, EngineError> {
        if let Some(existing) =
            self.stores.customers.find_by_phone(phone).await.map_err(store_err)?
        {
            return Ok(existing);
        }

        let fresh = Customer {
            id: CustomerId::generate(),
            name: name.to_string(),
            phone: phone.clone(),
            status: LeadStatus::initial(),
            last_activity: now,
            total_interactions: 0,
            history: Vec::new(),
            summary: SummaryStats::default(),
            created_at: now,
        };

        match self.stores.customers.insert(fresh.clone()).await {
            Ok(()) => Ok(fresh),
            Err(StoreError::DuplicateKey(_)) => self
                .stores
                .customers
                .find_by_phone(phone)
                .await
                .map_err(store_err)?
                .ok_or_else(|| {
                    EngineError::Store("customer missing after duplicate-key insert".to_string())
                }),
            Err(error) => Err(store_err(error)),
        }
    }

    async fn mirror_embedded(
        &self,
        activity: &NewActivity,
        customer: &Customer,
        vehicle: &Vehicle,
        validation: Option<&OfferValidation>,
        dedup_key: &str,
        now: DateTime<Utc>,
    ) {
        let snapshot =
            CustomerSnapshot { name: customer.name.clone(), phone: customer.phone.0.clone() };
        let append = match &activity.details {
            ActivityDetails::TestDrive { scheduled_at } => {
                Some(InteractionAppend::TestDrive(TestDriveEntry {
                    id: EntryId::generate(),
                    dedup_key: Some(dedup_key.to_string()),
                    customer: snapshot,
                    scheduled_at: *scheduled_at,
                    status: BookingStatus::Active,
                    notes: None,
                    created_at: now,
                }))
            }
            ActivityDetails::CashOffer { offered_price, notes } => {
                // Offers only reach the mirror step with a passing validation.
                let Some(validation) = validation else {
                    return;
                };
                Some(InteractionAppend::CashOffer(CashOfferEntry {
                    id: EntryId::generate(),
                    dedup_key: Some(dedup_key.to_string()),
                    customer: snapshot,
                    offered_price: *offered_price,
                    list_price: vehicle.price,
                    discount_amount: validation.discount_amount,
                    discount_pct: validation.discount_pct,
                    status: OfferStatus::Pending,
                    notes: notes.clone(),
                    created_at: now,
                }))
            }
            ActivityDetails::CreditSimulation { down_payment, tenor_months } => {
                Some(InteractionAppend::CreditRequest(CreditRequestEntry {
                    id: EntryId::generate(),
                    dedup_key: Some(dedup_key.to_string()),
                    customer: snapshot,
                    down_payment: *down_payment,
                    tenor_months: *tenor_months,
                    created_at: now,
                }))
            }
            // Views and purchases have no embedded list.
            ActivityDetails::ViewDetail | ActivityDetails::Purchase => None,
        };

        if let Some(append) = append {
            if let Err(error) =
                self.stores.vehicles.append_interaction(&vehicle.id, append).await
            {
                warn!(
                    event_name = "activity.embedded_mirror_failed",
                    vehicle_id = %vehicle.id,
                    customer_id = %customer.id,
                    error = %error,
                    "embedded mirror write failed, profile write stands"
                );
            }
        }
    }

    async fn mirror_legacy(
        &self,
        activity: &NewActivity,
        customer: &Customer,
        vehicle: &Vehicle,
        validation: Option<&OfferValidation>,
        dedup_key: &str,
        now: DateTime<Utc>,
    ) {
        let mut payload = json!({
            "customer_name": customer.name,
            "phone": customer.phone.0,
        });
        let extra = match &activity.details {
            ActivityDetails::ViewDetail | ActivityDetails::Purchase => json!({}),
            ActivityDetails::CreditSimulation { down_payment, tenor_months } => json!({
                "down_payment": down_payment,
                "tenor_months": tenor_months,
            }),
            ActivityDetails::TestDrive { scheduled_at } => json!({
                "scheduled_at": scheduled_at.to_rfc3339(),
                "status": BookingStatus::Active.as_str(),
            }),
            ActivityDetails::CashOffer { offered_price, notes } => json!({
                "offered_price": offered_price,
                "list_price": vehicle.price,
                "discount_pct": validation.map(|v| v.discount_pct),
                "status": OfferStatus::Pending.as_str(),
                "notes": notes,
            }),
        };
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }

        let event = LegacyEvent {
            id: LegacyEventId::generate(),
            customer_id: customer.id.clone(),
            vehicle_id: vehicle.id.clone(),
            kind: activity.details.kind(),
            payload,
            dedup_key: Some(dedup_key.to_string()),
            occurred_at: now,
        };

        if let Err(error) = self.stores.legacy_events.insert(event).await {
            warn!(
                event_name = "activity.legacy_mirror_failed",
                vehicle_id = %vehicle.id,
                customer_id = %customer.id,
                error = %error,
                "legacy mirror write failed, profile write stands"
            );
        }
    }
}

impl RecordOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}
