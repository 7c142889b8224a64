//! Pure business rules behind the interaction engine.
//!
//! Every function here is total: policy violations come back as values
//! (`OfferValidation { is_valid: false, .. }`), never as errors or panics.

pub mod dedup;
pub mod lifecycle;
pub mod offer;
pub mod phone;
pub mod scoring;
