//! Gross/net conversion and the canonical rounding rule.
//!
//! All money in the checkout is `rust_decimal::Decimal` in major currency
//! units (PLN, not grosze). The one rounding rule lives here: half-up to
//! two decimal places, applied at the point of final display/storage.
//! Intermediate net values are kept unrounded so that long carts do not
//! accumulate per-line rounding drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places using half-up rounding on the value in major
/// currency units.
///
/// Idempotent: `round2(round2(x)) == round2(x)`.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a net amount to gross at the given VAT rate.
///
/// `round2(net * (1 + vat_rate))`.
#[must_use]
pub fn to_gross(net: Decimal, vat_rate: Decimal) -> Decimal {
    round2(net * (Decimal::ONE + vat_rate))
}
