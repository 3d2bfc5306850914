//! End-to-end pricing scenarios for the checkout rules.
//!
//! Each test is a full order priced through the public API, with the exact
//! figures the storefront displays and persists.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use rotorparts_core::{
    CartLine, PricingConfig, ShippingMethod, ShippingSelection, TaxProfile, compute_breakdown,
};

fn standard_config() -> PricingConfig {
    PricingConfig::default()
}

fn validated_intra_community() -> TaxProfile {
    TaxProfile {
        vat_identifier: "DE811569869".to_string(),
        country_prefix: "DE".to_string(),
        is_valid: true,
        is_intra_community: true,
        exempt_from_vat: true,
        resolved_company_name: Some("Example Flugtechnik GmbH".to_string()),
        message: None,
    }
}

#[test]
fn domestic_prepaid_courier_below_threshold() {
    // 1000.00 net cart, 23% VAT, 18.00 courier, no COD, no exemption
    let lines = vec![CartLine::new("motor-2207", dec!(250.00), 4)];
    let shipping = ShippingSelection::prepaid(ShippingMethod::Courier, dec!(18.00));

    let breakdown = compute_breakdown(&lines, &shipping, &TaxProfile::default(), &standard_config());

    assert_eq!(breakdown.subtotal_net, dec!(1000.00));
    assert_eq!(breakdown.subtotal_vat, dec!(230.00));
    assert_eq!(breakdown.subtotal_gross, dec!(1230.00));
    assert_eq!(breakdown.shipping_gross, dec!(22.14));
    assert_eq!(breakdown.total_gross, dec!(1252.14));
}

#[test]
fn intra_community_exemption_zeroes_all_vat() {
    // Same cart as above, but with a validated German VAT number
    let lines = vec![CartLine::new("motor-2207", dec!(250.00), 4)];
    let shipping = ShippingSelection::prepaid(ShippingMethod::Courier, dec!(18.00));

    let breakdown =
        compute_breakdown(&lines, &shipping, &validated_intra_community(), &standard_config());

    assert_eq!(breakdown.subtotal_vat, Decimal::ZERO);
    assert_eq!(breakdown.shipping_vat, Decimal::ZERO);
    assert_eq!(breakdown.total_gross, dec!(1018.00));
    assert_eq!(breakdown.total_gross, breakdown.total_net);
}

#[test]
fn threshold_boundary_waives_base_but_not_cod() {
    // Gross subtotal lands exactly on the 5000.00 threshold
    let net = dec!(4065.04);
    assert_eq!(rotorparts_core::money::to_gross(net, dec!(0.23)), dec!(5000.00));

    let lines = vec![CartLine::new("long-range-kit", net, 1)];
    let shipping = ShippingSelection {
        method: ShippingMethod::Locker,
        base_price: dec!(13.99),
        cod_surcharge: dec!(10.00),
    };

    let breakdown = compute_breakdown(&lines, &shipping, &TaxProfile::default(), &standard_config());

    // Base price waived at the inclusive boundary, COD surcharge kept and taxed
    assert_eq!(breakdown.shipping_net, dec!(10.00));
    assert_eq!(breakdown.shipping_vat, dec!(2.30));
    assert_eq!(breakdown.shipping_gross, dec!(12.30));
}

#[test]
fn many_small_lines_round_once_at_the_end() {
    // 7 lines of 0.333 each: per-line rounding would drift from the true sum
    let lines: Vec<CartLine> = (0..7)
        .map(|i| CartLine::new(format!("washer-{i}"), dec!(0.333), 1))
        .collect();
    let shipping = ShippingSelection::prepaid(ShippingMethod::Locker, dec!(13.99));

    let breakdown = compute_breakdown(&lines, &shipping, &TaxProfile::default(), &standard_config());

    // 7 * 0.333 = 2.331 -> 2.33, not 7 * round2(0.333) = 2.31
    assert_eq!(breakdown.subtotal_net, dec!(2.33));
}

#[test]
fn breakdown_arithmetic_holds_for_mixed_cart() {
    let lines = vec![
        CartLine::new("battery-6s", dec!(189.99), 3),
        CartLine::new("props-5143", dec!(12.49), 8),
        CartLine::new("camera-nano", dec!(449.00), 1),
    ];
    let shipping = ShippingSelection {
        method: ShippingMethod::Courier,
        base_price: dec!(18.00),
        cod_surcharge: dec!(10.00),
    };

    let breakdown = compute_breakdown(&lines, &shipping, &TaxProfile::default(), &standard_config());

    assert_eq!(breakdown.total_net, breakdown.subtotal_net + breakdown.shipping_net);
    assert_eq!(breakdown.total_vat, breakdown.subtotal_vat + breakdown.shipping_vat);
    assert_eq!(breakdown.total_gross, breakdown.total_net + breakdown.total_vat);
    assert_eq!(
        breakdown.subtotal_vat,
        rotorparts_core::money::round2(breakdown.subtotal_net * dec!(0.23))
    );
}
