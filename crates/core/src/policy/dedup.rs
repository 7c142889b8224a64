//! Dedup keys recognizing one logical event across both representations.
//!
//! Storage ids differ between the embedded and legacy copies of the same
//! event, so readers key on stable business fields instead. New writes also
//! stamp an exact key into both copies; the composite forms below are the
//! fallback for rows that pre-date the stamping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::vehicle::VehicleId;
use crate::policy::phone::normalize_phone;

/// Exact key stamped into both representations at write time.
pub fn stamped_dedup_key(
    phone: &str,
    vehicle_id: &VehicleId,
    occurred_at: DateTime<Utc>,
) -> String {
    format!("{}:{}:{}", normalize_phone(phone), vehicle_id.0, occurred_at.timestamp_millis())
}

/// Composite booking key: phone + vehicle + test date truncated to the day.
pub fn booking_dedup_key(
    phone: &str,
    vehicle_id: &VehicleId,
    scheduled_at: DateTime<Utc>,
) -> String {
    format!(
        "booking:{}:{}:{}",
        normalize_phone(phone),
        vehicle_id.0,
        scheduled_at.format("%Y-%m-%d")
    )
}

/// Composite offer key: phone + vehicle + offered amount.
pub fn offer_dedup_key(phone: &str, vehicle_id: &VehicleId, offered_price: Decimal) -> String {
    format!("offer:{}:{}:{}", normalize_phone(phone), vehicle_id.0, offered_price.normalize())
}
