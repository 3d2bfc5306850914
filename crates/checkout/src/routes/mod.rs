//! HTTP route handlers for the checkout API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//!
//! # Checkout
//! POST /api/checkout/quote     - Price a cart (authoritative breakdown)
//! POST /api/vat/validate       - Validate a VAT identifier for exemption
//! GET  /api/lockers/search?q=  - Resolve parcel locker candidates
//! ```
//!
//! A failed VAT validation or locker search blocks only its own step; the
//! quote endpoint always answers for a well-formed cart.

pub mod lockers;
pub mod quote;
pub mod vat;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the checkout API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/quote", post(quote::quote))
        .route("/api/vat/validate", post(vat::validate))
        .route("/api/lockers/search", get(lockers::search))
}
