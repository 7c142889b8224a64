use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::activity::ActivityKind;
use crate::domain::customer::CustomerId;
use crate::domain::vehicle::{BookingStatus, OfferStatus, VehicleId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyEventId(pub String);

impl LegacyEventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegacyBookingId(pub String);

impl LegacyBookingId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Flat pre-migration event row, one per activity.
///
/// Written in parallel with the embedded vehicle/customer update for every
/// recorded activity and treated as equally authoritative on reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyEvent {
    pub id: LegacyEventId,
    pub customer_id: CustomerId,
    pub vehicle_id: VehicleId,
    pub kind: ActivityKind,
    /// Free-form kind-specific payload, shape owned by the legacy consumers.
    pub payload: serde_json::Value,
    /// Stamped by the dual-write; absent on rows that pre-date it.
    pub dedup_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Typed view of a `beli_cash` legacy payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyOfferPayload {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub offered_price: Option<Decimal>,
    #[serde(default)]
    pub list_price: Option<Decimal>,
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LegacyEvent {
    pub fn offer_payload(&self) -> Option<LegacyOfferPayload> {
        if self.kind != ActivityKind::CashOffer {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Test-drive booking row from before the embedded model existed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyBooking {
    pub id: LegacyBookingId,
    pub customer_name: String,
    /// Raw as captured; normalize before comparing with embedded entries.
    pub phone: String,
    pub vehicle_id: VehicleId,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
