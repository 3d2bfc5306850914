//! The pricing engine.
//!
//! Pure, synchronous, deterministic: given cart lines, a shipping selection,
//! a tax profile, and an explicit [`PricingConfig`], produce the
//! [`PriceBreakdown`] persisted on the order. No I/O, no ambient settings,
//! and it never fails - any well-typed input yields a breakdown, including
//! an empty cart (all zeroes) and a not-yet-validated tax profile.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{round2, to_gross};
use crate::types::{CartLine, ShippingSelection, TaxProfile};

/// Policy values the engine needs, passed explicitly so it stays pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Standard VAT rate applied to non-exempt orders.
    pub vat_rate: Decimal,
    /// Gross subtotal at or above which the shipping base price is waived.
    pub free_shipping_threshold_gross: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            // 23% Polish standard rate
            vat_rate: Decimal::new(23, 2),
            free_shipping_threshold_gross: Decimal::from(5000),
        }
    }
}

/// Net/VAT/gross totals for the order, broken out by subtotal and shipping.
///
/// Invariant: each `*_vat` is exactly `round2(*_net * vat_rate)` unless the
/// order is exempt, in which case all VAT fields are zero and every gross
/// equals its net. Recomputed fresh on every relevant input change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal_net: Decimal,
    pub subtotal_vat: Decimal,
    pub subtotal_gross: Decimal,
    pub shipping_net: Decimal,
    pub shipping_vat: Decimal,
    pub shipping_gross: Decimal,
    pub total_net: Decimal,
    pub total_vat: Decimal,
    pub total_gross: Decimal,
}

/// Compute the authoritative price breakdown for an order.
///
/// Steps:
/// 1. Sum net line prices, unrounded.
/// 2. Waive the shipping base price when the *gross* subtotal reaches the
///    free-shipping threshold (inclusive boundary). The comparison is
///    against gross even though the shipping line itself is still net at
///    this point - a product-policy choice, kept as-is.
/// 3. Add the COD surcharge to shipping. It is a payment-method fee and is
///    never waived by free shipping.
/// 4. Apply VAT per the tax profile. The surcharge inherits the order's
///    exemption status; it is never taxed independently of the rest.
#[must_use]
pub fn compute_breakdown(
    lines: &[CartLine],
    shipping: &ShippingSelection,
    tax_profile: &TaxProfile,
    config: &PricingConfig,
) -> PriceBreakdown {
    let subtotal_net: Decimal = lines.iter().map(CartLine::line_net).sum();

    let is_free_shipping =
        to_gross(subtotal_net, config.vat_rate) >= config.free_shipping_threshold_gross;
    let base = if is_free_shipping {
        Decimal::ZERO
    } else {
        shipping.base_price
    };
    let shipping_net = base + shipping.cod_surcharge;

    let subtotal_net = round2(subtotal_net);
    let shipping_net = round2(shipping_net);

    let (subtotal_vat, shipping_vat) = if tax_profile.exempt_from_vat {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            round2(subtotal_net * config.vat_rate),
            round2(shipping_net * config.vat_rate),
        )
    };

    let subtotal_gross = subtotal_net + subtotal_vat;
    let shipping_gross = shipping_net + shipping_vat;

    PriceBreakdown {
        subtotal_net,
        subtotal_vat,
        subtotal_gross,
        shipping_net,
        shipping_vat,
        shipping_gross,
        total_net: subtotal_net + shipping_net,
        total_vat: subtotal_vat + shipping_vat,
        total_gross: subtotal_gross + shipping_gross,
    }
}
