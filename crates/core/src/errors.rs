use thiserror::Error;

use crate::domain::customer::CustomerId;
use crate::domain::vehicle::VehicleId;

/// Failures crossing the engine boundary.
///
/// Policy violations are deliberately absent: a rejected cash offer is a
/// structured result (`RecordOutcome::Rejected`), not an error. Mirror-write
/// failures after the authoritative customer write are logged and swallowed,
/// so they never appear here either.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("vehicle not found: {0}")]
    VehicleNotFound(VehicleId),
    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),
    #[error("no matching {entity} `{id}` in either the embedded or the legacy store")]
    NotReconciled { entity: &'static str, id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store failure: {0}")]
    Store(String),
}

impl EngineError {
    pub fn not_reconciled(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotReconciled { entity, id: id.into() }
    }
}
