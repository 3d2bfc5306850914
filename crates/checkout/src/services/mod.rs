//! External-service adapters for the checkout.
//!
//! # Services
//!
//! - [`vat`] - EU VAT registry lookup and intra-community exemption
//! - [`geocoding`] - Free-text address to coordinates, best match only
//! - [`lockers`] - Parcel locker directory and the fallback search chain
//! - [`sequence`] - Latest-wins guard for overlapping async lookups
//!
//! Network failures are caught at these boundaries and normalized into the
//! error taxonomy (local validation, retryable unavailability, or a plain
//! not-found outcome) before anything reaches the pricing engine. A failing
//! adapter blocks only its own step; pricing always proceeds.

pub mod geocoding;
pub mod lockers;
pub mod sequence;
pub mod vat;

pub use geocoding::GeocodingClient;
pub use lockers::{LockerDirectoryClient, LockerResolver};
pub use sequence::{RequestSequencer, SessionSequencers};
pub use vat::ViesClient;
