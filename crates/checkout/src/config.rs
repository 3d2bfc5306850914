//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (all have defaults)
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `VIES_BASE_URL` - EU VAT registry endpoint
//! - `SELLER_COUNTRY` - Seller's home member state (default: PL)
//! - `GEOCODER_BASE_URL` - Nominatim-compatible geocoding endpoint
//! - `GEOCODER_USER_AGENT` - User-Agent sent to the geocoder (its usage
//!   policy requires an identifying agent)
//! - `LOCKER_API_BASE_URL` - Parcel locker directory endpoint
//! - `LOCKER_API_TOKEN` - Directory API token, if the deployment needs one
//! - `VAT_RATE` - Standard VAT rate (default: 0.23)
//! - `FREE_SHIPPING_THRESHOLD` - Gross subtotal waiving shipping (default: 5000)
//! - `SHIPPING_PRICE_LOCKER` - Locker tier net price (default: 13.99)
//! - `SHIPPING_PRICE_COURIER` - Courier tier net price (default: 18.00)
//! - `COD_SURCHARGE` - Cash-on-delivery surcharge (default: 10.00)

use std::net::{IpAddr, SocketAddr};

use rotorparts_core::PricingConfig;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout application configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// VAT registry lookup configuration
    pub vies: ViesConfig,
    /// Geocoder configuration
    pub geocoder: GeocoderConfig,
    /// Parcel locker directory configuration
    pub lockers: LockerApiConfig,
    /// Pricing policy values passed into the pricing engine
    pub pricing: PricingConfig,
    /// Shipping tier price table
    pub shipping: ShippingRates,
}

/// EU VAT registry (VIES) configuration.
#[derive(Debug, Clone)]
pub struct ViesConfig {
    /// Base URL of the registry's REST check service
    pub base_url: String,
    /// Seller's home member state; valid numbers from here are never exempt
    pub seller_country: String,
}

/// Geocoder configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of the Nominatim-compatible search endpoint
    pub base_url: String,
    /// Identifying User-Agent for the geocoder's usage policy
    pub user_agent: String,
}

/// Parcel locker directory configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct LockerApiConfig {
    /// Base URL of the locker directory API
    pub base_url: String,
    /// Bearer token, when the deployment's directory requires one
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for LockerApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockerApiConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Net prices for the shipping tiers offered at checkout.
#[derive(Debug, Clone)]
pub struct ShippingRates {
    pub locker: Decimal,
    pub courier: Decimal,
    pub cod_surcharge: Decimal,
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CHECKOUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CHECKOUT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_PORT".to_string(), e.to_string()))?;

        let vies = ViesConfig {
            base_url: get_base_url_or_default(
                "VIES_BASE_URL",
                "https://ec.europa.eu/taxation_customs/vies/rest-api",
            )?,
            seller_country: get_env_or_default("SELLER_COUNTRY", "PL").to_uppercase(),
        };

        let geocoder = GeocoderConfig {
            base_url: get_base_url_or_default(
                "GEOCODER_BASE_URL",
                "https://nominatim.openstreetmap.org",
            )?,
            user_agent: get_env_or_default(
                "GEOCODER_USER_AGENT",
                "rotorparts-checkout/0.1 (dev@rotorparts.pl)",
            ),
        };

        let lockers = LockerApiConfig {
            base_url: get_base_url_or_default(
                "LOCKER_API_BASE_URL",
                "https://api-pl-points.easypack24.net",
            )?,
            api_token: get_optional_env("LOCKER_API_TOKEN").map(SecretString::from),
        };

        let pricing = PricingConfig {
            vat_rate: get_decimal_or_default("VAT_RATE", "0.23")?,
            free_shipping_threshold_gross: get_decimal_or_default("FREE_SHIPPING_THRESHOLD", "5000")?,
        };

        let shipping = ShippingRates {
            locker: get_decimal_or_default("SHIPPING_PRICE_LOCKER", "13.99")?,
            courier: get_decimal_or_default("SHIPPING_PRICE_COURIER", "18.00")?,
            cod_surcharge: get_decimal_or_default("COD_SURCHARGE", "10.00")?,
        };

        Ok(Self {
            host,
            port,
            vies,
            geocoder,
            lockers,
            pricing,
            shipping,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a decimal environment variable with a default value.
fn get_decimal_or_default(key: &str, default: &str) -> Result<Decimal, ConfigError> {
    get_env_or_default(key, default)
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a base URL environment variable, validated as an absolute URL.
fn get_base_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    let value = get_env_or_default(key, default);
    url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_default_parses() {
        let rate = get_decimal_or_default("ROTORPARTS_TEST_UNSET_VAR", "0.23").unwrap();
        assert_eq!(rate, Decimal::new(23, 2));
    }

    #[test]
    fn test_locker_config_debug_redacts_token() {
        let config = LockerApiConfig {
            base_url: "https://lockers.example".to_string(),
            api_token: Some(SecretString::from("super_secret_token")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://lockers.example"));
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("super_secret_token"));
    }

    #[test]
    fn test_socket_addr() {
        let config = CheckoutConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            vies: ViesConfig {
                base_url: "https://vies.test".to_string(),
                seller_country: "PL".to_string(),
            },
            geocoder: GeocoderConfig {
                base_url: "https://geo.test".to_string(),
                user_agent: "test".to_string(),
            },
            lockers: LockerApiConfig {
                base_url: "https://lockers.test".to_string(),
                api_token: None,
            },
            pricing: PricingConfig::default(),
            shipping: ShippingRates {
                locker: Decimal::new(1399, 2),
                courier: Decimal::new(1800, 2),
                cod_surcharge: Decimal::new(1000, 2),
            },
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
