//! Rotorparts Core - Pure pricing and checkout types.
//!
//! This crate holds everything the checkout needs that is deterministic:
//! - [`money`] - Gross/net conversion and the canonical rounding rule
//! - [`types`] - Cart lines, shipping selection, tax profile, locker candidates
//! - [`pricing`] - The pricing engine that produces the order's `PriceBreakdown`
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no ambient configuration. The pricing engine takes its policy
//! values (VAT rate, free-shipping threshold) as an explicit
//! [`pricing::PricingConfig`] so it stays independently testable. The
//! breakdown it returns is the authoritative number persisted on the order;
//! it is always recomputed from source values, never mutated in place.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod money;
pub mod pricing;
pub mod types;

pub use pricing::{PriceBreakdown, PricingConfig, compute_breakdown};
pub use types::*;
