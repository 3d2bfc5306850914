//! Price quote route handler.
//!
//! Takes the cart, the chosen shipping method, the payment method, and an
//! optional already-validated tax profile, and returns the authoritative
//! [`PriceBreakdown`]. The handler resolves the shipping tier price and COD
//! surcharge from configuration, then delegates to the pure pricing engine.

use axum::{Json, extract::State};
use rotorparts_core::{
    CartLine, PaymentMethod, PriceBreakdown, ShippingMethod, ShippingSelection, TaxProfile,
    compute_breakdown,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Quote request payload.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub lines: Vec<CartLine>,
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Profile from a prior `/api/vat/validate` call; absent means no
    /// exemption is claimed (or validation has not completed yet).
    #[serde(default)]
    pub tax_profile: Option<TaxProfile>,
}

/// Compute the price breakdown for a cart.
#[instrument(skip(state, request), fields(lines = request.lines.len()))]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PriceBreakdown>> {
    validate_lines(&request.lines)?;

    let config = state.config();
    let base_price = match request.shipping_method {
        ShippingMethod::Locker => config.shipping.locker,
        ShippingMethod::Courier => config.shipping.courier,
    };
    let cod_surcharge = match request.payment_method {
        PaymentMethod::CashOnDelivery => config.shipping.cod_surcharge,
        PaymentMethod::Prepaid => Decimal::ZERO,
    };
    let shipping = ShippingSelection {
        method: request.shipping_method,
        base_price,
        cod_surcharge,
    };

    let tax_profile = sanitize_profile(request.tax_profile.unwrap_or_default());

    let breakdown = compute_breakdown(&request.lines, &shipping, &tax_profile, &config.pricing);
    Ok(Json(breakdown))
}

/// Reject malformed carts before pricing: negative prices and zero
/// quantities are client errors, not pricing inputs.
fn validate_lines(lines: &[CartLine]) -> Result<()> {
    for line in lines {
        if line.unit_price_net < Decimal::ZERO {
            return Err(AppError::BadRequest(format!(
                "negative unit price on product {}",
                line.product_id
            )));
        }
        if line.quantity == 0 {
            return Err(AppError::BadRequest(format!(
                "zero quantity on product {}",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// A client-supplied profile claiming exemption without a valid
/// intra-community number gets its exemption cleared rather than priced.
fn sanitize_profile(mut profile: TaxProfile) -> TaxProfile {
    if !profile.is_consistent() {
        warn!(
            identifier = %profile.vat_identifier,
            "inconsistent tax profile in quote request, clearing exemption"
        );
        profile.exempt_from_vat = false;
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::CheckoutConfig;

    fn test_state() -> AppState {
        // Nothing sets these env vars in tests, so defaults apply
        AppState::new(CheckoutConfig::from_env().unwrap())
    }

    fn quote_request(lines: Vec<CartLine>) -> QuoteRequest {
        QuoteRequest {
            lines,
            shipping_method: ShippingMethod::Courier,
            payment_method: PaymentMethod::Prepaid,
            tax_profile: None,
        }
    }

    #[tokio::test]
    async fn test_quote_prices_standard_cart() {
        let request = quote_request(vec![CartLine::new("motor-2207", dec!(250.00), 4)]);

        let Json(breakdown) = quote(State(test_state()), Json(request)).await.unwrap();

        assert_eq!(breakdown.subtotal_net, dec!(1000.00));
        assert_eq!(breakdown.subtotal_vat, dec!(230.00));
        assert_eq!(breakdown.shipping_gross, dec!(22.14));
        assert_eq!(breakdown.total_gross, dec!(1252.14));
    }

    #[tokio::test]
    async fn test_quote_rejects_zero_quantity() {
        let request = quote_request(vec![CartLine::new("motor-2207", dec!(250.00), 0)]);

        let result = quote(State(test_state()), Json(request)).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_quote_rejects_negative_price() {
        let request = quote_request(vec![CartLine::new("motor-2207", dec!(-1.00), 1)]);

        let result = quote(State(test_state()), Json(request)).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_quote_applies_cod_surcharge() {
        let mut request = quote_request(vec![CartLine::new("frame-5in", dec!(89.50), 1)]);
        request.payment_method = PaymentMethod::CashOnDelivery;
        request.shipping_method = ShippingMethod::Locker;

        let Json(breakdown) = quote(State(test_state()), Json(request)).await.unwrap();

        // 13.99 locker tier + 10.00 COD surcharge
        assert_eq!(breakdown.shipping_net, dec!(23.99));
    }

    #[tokio::test]
    async fn test_quote_clears_inconsistent_exemption() {
        let mut request = quote_request(vec![CartLine::new("battery-6s", dec!(100.00), 1)]);
        request.tax_profile = Some(TaxProfile {
            // Claims exemption without a registry-valid number
            exempt_from_vat: true,
            ..TaxProfile::default()
        });

        let Json(breakdown) = quote(State(test_state()), Json(request)).await.unwrap();

        assert_eq!(breakdown.subtotal_vat, dec!(23.00));
    }

    #[tokio::test]
    async fn test_quote_empty_cart_still_answers() {
        let request = quote_request(vec![]);

        let Json(breakdown) = quote(State(test_state()), Json(request)).await.unwrap();

        assert_eq!(breakdown.subtotal_net, Decimal::ZERO);
    }
}
