pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod policy;

pub use chrono;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AnalyticsConfig, AppConfig, ConfigError, DatabaseConfig, LoadOptions,
    LoggingConfig, PolicyConfig};
pub use domain::activity::{ActivityDetails, ActivityKind};
pub use domain::customer::{
    Customer, CustomerId, InteractionEntry, LeadStatus, PhoneNumber, SummaryStats,
    VehicleSnapshot,
};
pub use domain::legacy::{
    LegacyBooking, LegacyBookingId, LegacyEvent, LegacyEventId, LegacyOfferPayload,
};
pub use domain::vehicle::{
    BookingStatus, CashOfferEntry, CreditRequestEntry, CustomerSnapshot, EntryId, OfferStatus,
    TestDriveEntry, Vehicle, VehicleId, VehicleInteractions, VehicleStatus,
};
pub use errors::EngineError;
pub use policy::lifecycle::{lifecycle_step, LifecycleStep};
pub use policy::offer::{validate_cash_offer, OfferValidation};
pub use policy::phone::{normalize_phone, whatsapp_link};
pub use policy::scoring::{customer_priority, engagement_score, is_ready_for_follow_up, Priority};
