//! Checkout data model shared across the workspace.
//!
//! These are plain serde structs: the cart line the pricing engine consumes,
//! the shipping selection, the tax profile produced by VAT validation, and
//! the locker candidate produced by the locker resolver. None of them carry
//! behavior beyond small constructors and invariant helpers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line in the cart: one product at one net unit price.
///
/// Owned by the cart/session and ephemeral; the pricing engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier (catalog-side, opaque here).
    pub product_id: String,
    /// Net unit price in major currency units (PLN). Non-negative.
    pub unit_price_net: Decimal,
    /// Quantity ordered. At least 1 for a meaningful line.
    pub quantity: u32,
}

impl CartLine {
    /// Create a cart line.
    #[must_use]
    pub fn new(product_id: impl Into<String>, unit_price_net: Decimal, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price_net,
            quantity,
        }
    }

    /// Net extended price for this line (`unit_price_net * quantity`),
    /// deliberately unrounded.
    #[must_use]
    pub fn line_net(&self) -> Decimal {
        self.unit_price_net * Decimal::from(self.quantity)
    }
}

/// How the order is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Parcel locker delivery point.
    Locker,
    /// Door-to-door courier.
    Courier,
}

/// How the order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid online before dispatch.
    #[default]
    Prepaid,
    /// Cash on delivery - carries a payment-method surcharge.
    CashOnDelivery,
}

/// The shipping tier chosen at checkout.
///
/// `base_price` is the tier's list price; the pricing engine waives it when
/// the gross subtotal reaches the free-shipping threshold. `cod_surcharge`
/// is a payment-method fee, not a delivery fee - it is never waived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSelection {
    pub method: ShippingMethod,
    pub base_price: Decimal,
    pub cod_surcharge: Decimal,
}

impl ShippingSelection {
    /// Shipping selection with no COD surcharge (prepaid orders).
    #[must_use]
    pub const fn prepaid(method: ShippingMethod, base_price: Decimal) -> Self {
        Self {
            method,
            base_price,
            cod_surcharge: Decimal::ZERO,
        }
    }
}

/// Outcome of validating a VAT identifier against the registry.
///
/// Derived data, persisted only as part of the order snapshot.
///
/// Invariant: `exempt_from_vat` implies `is_valid && is_intra_community`.
/// The default profile (nothing claimed, nothing validated) has all flags
/// false, so pricing can always run before validation completes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxProfile {
    /// The identifier as submitted, trimmed (e.g. "DE123456789").
    pub vat_identifier: String,
    /// Two-letter country prefix extracted from the identifier.
    pub country_prefix: String,
    /// Whether the registry recognized the number.
    pub is_valid: bool,
    /// Whether the prefix denotes an EU member state other than the seller's.
    pub is_intra_community: bool,
    /// Whether the transaction qualifies for 0% intra-community VAT.
    pub exempt_from_vat: bool,
    /// Company name as registered, when the registry returned one.
    pub resolved_company_name: Option<String>,
    /// Caller-facing note, e.g. "unrecognized VAT number".
    pub message: Option<String>,
}

impl TaxProfile {
    /// Whether the internal invariant holds: exemption requires a valid,
    /// intra-community number.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !self.exempt_from_vat || (self.is_valid && self.is_intra_community)
    }
}

/// A geographic point returned by the geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A parcel locker matching a search query.
///
/// Produced transiently by the locker resolver; the user's final selection
/// becomes part of the persisted shipping address. `distance_meters` is only
/// present for proximity search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerCandidate {
    /// Directory identifier (e.g. "RYB01M").
    pub id: String,
    /// Street and building number.
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    /// Location hint shown to the user ("by the petrol station").
    pub description: Option<String>,
    /// Distance from the geocoded query point, ascending sort key.
    pub distance_meters: Option<u32>,
}
