//! Customer interaction consolidation & validation engine.
//!
//! Three components over the four record stores:
//! - [`recorder::ActivityRecorder`] — the only writer of new activity; dual
//!   writes the embedded and legacy representations.
//! - [`reader::ConsolidationReader`] — merges both representations into one
//!   deduplicated, time-sorted view; never mutates state.
//! - [`lifecycle::LifecycleOps`] — status transitions and the booking expiry
//!   sweep, with embedded-then-legacy fallback probing.

pub mod lifecycle;
pub mod reader;
pub mod recorder;

use std::sync::Arc;

use garasi_core::errors::EngineError;
use garasi_db::stores::{
    CustomerStore, LegacyBookingStore, LegacyEventStore, StoreError, VehicleStore,
};

pub use lifecycle::{ExpirySweep, LifecycleOps};
pub use reader::{
    ConsolidatedBooking, ConsolidatedOffer, ConsolidationReader, RecordSource, VehicleAnalytics,
};
pub use recorder::{ActivityRecorder, NewActivity, RecordOutcome, RecordedActivity};

/// Handles to the four collections the engine consolidates.
#[derive(Clone)]
pub struct EngineStores {
    pub vehicles: Arc<dyn VehicleStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub legacy_events: Arc<dyn LegacyEventStore>,
    pub legacy_bookings: Arc<dyn LegacyBookingStore>,
}

pub(crate) fn store_err(error: StoreError) -> EngineError {
    EngineError::Store(error.to_string())
}
