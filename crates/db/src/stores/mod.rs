//! Store contracts for the four collections the engine consolidates.
//!
//! The engine never talks to sqlite directly; it holds these traits so tests
//! can run against the in-memory doubles and the storage technology stays a
//! collaborator, not a dependency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use garasi_core::domain::activity::ActivityKind;
use garasi_core::domain::customer::{Customer, CustomerId, PhoneNumber};
use garasi_core::domain::legacy::{LegacyBooking, LegacyBookingId, LegacyEvent, LegacyEventId};
use garasi_core::domain::vehicle::{
    BookingStatus, CashOfferEntry, CreditRequestEntry, EntryId, OfferStatus, TestDriveEntry,
    Vehicle, VehicleId,
};

pub mod customer;
pub mod legacy_booking;
pub mod legacy_event;
pub mod memory;
pub mod vehicle;

pub use customer::SqlCustomerStore;
pub use legacy_booking::SqlLegacyBookingStore;
pub use legacy_event::SqlLegacyEventStore;
pub use memory::{
    InMemoryCustomerStore, InMemoryLegacyBookingStore, InMemoryLegacyEventStore,
    InMemoryVehicleStore,
};
pub use vehicle::SqlVehicleStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
}

/// One embedded interaction ready to be appended onto a vehicle document.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionAppend {
    TestDrive(TestDriveEntry),
    CashOffer(CashOfferEntry),
    CreditRequest(CreditRequestEntry),
}

impl InteractionAppend {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::TestDrive(_) => ActivityKind::TestDrive,
            Self::CashOffer(_) => ActivityKind::CashOffer,
            Self::CreditRequest(_) => ActivityKind::CreditSimulation,
        }
    }
}

/// Per-vehicle, per-kind event count from the legacy collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleKindCount {
    pub vehicle_id: VehicleId,
    pub kind: ActivityKind,
    pub count: u64,
}

/// Date bounds for legacy analytics aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Exclusive upper bound on dual-written kinds (dual-write cutover).
    /// Kinds without an embedded mirror are never bounded.
    pub before: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, StoreError>;
    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError>;
    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError>;

    /// Atomic append onto the embedded interaction list for `entry`'s kind.
    async fn append_interaction(
        &self,
        id: &VehicleId,
        entry: InteractionAppend,
    ) -> Result<(), StoreError>;

    /// Update one embedded cash offer by subdocument id. Returns whether a
    /// row matched.
    async fn update_offer_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError>;

    /// Update one embedded test-drive booking by subdocument id.
    async fn update_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError>;

    /// Remove one embedded test-drive booking by subdocument id.
    async fn remove_booking_entry(
        &self,
        vehicle_id: &VehicleId,
        entry_id: &EntryId,
    ) -> Result<bool, StoreError>;

    /// Flip every `active` embedded booking scheduled strictly before
    /// `cutoff` to `expired`. Returns how many entries changed.
    async fn expire_active_bookings_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Customer>, StoreError>;
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, StoreError>;

    /// Create a new profile. Surfaces [`StoreError::DuplicateKey`] when the
    /// canonical phone already exists, so callers can retry as an update.
    async fn insert(&self, customer: Customer) -> Result<(), StoreError>;

    async fn save(&self, customer: Customer) -> Result<(), StoreError>;
    async fn list_by_last_activity(&self) -> Result<Vec<Customer>, StoreError>;
}

#[async_trait]
pub trait LegacyEventStore: Send + Sync {
    async fn insert(&self, event: LegacyEvent) -> Result<(), StoreError>;
    async fn list_by_kind(&self, kind: ActivityKind) -> Result<Vec<LegacyEvent>, StoreError>;

    /// Fallback mutation for offers that only exist as legacy rows. Returns
    /// whether a row matched.
    async fn update_offer_status(
        &self,
        id: &LegacyEventId,
        status: OfferStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError>;

    async fn count_by_vehicle_and_kind(
        &self,
        filter: AnalyticsFilter,
    ) -> Result<Vec<VehicleKindCount>, StoreError>;
}

#[async_trait]
pub trait LegacyBookingStore: Send + Sync {
    async fn insert(&self, booking: LegacyBooking) -> Result<(), StoreError>;
    async fn list_all(&self) -> Result<Vec<LegacyBooking>, StoreError>;
    async fn find_by_id(&self, id: &LegacyBookingId) -> Result<Option<LegacyBooking>, StoreError>;

    /// Returns whether a row matched.
    async fn update_status(
        &self,
        id: &LegacyBookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<bool, StoreError>;

    async fn delete(&self, id: &LegacyBookingId) -> Result<bool, StoreError>;

    /// Bulk-expire `active` rows scheduled strictly before `cutoff`.
    async fn expire_active_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
