//! EU VAT registry client and intra-community exemption classification.
//!
//! Submits a VAT identifier to the VIES-style REST check service and turns
//! the answer into a [`TaxProfile`]. Local problems (empty input, malformed
//! prefix) fail before any network call. A registry-confirmed "number not
//! found" - including a 4xx rejection of the lookup itself - is a valid
//! outcome, not an error; an unreachable registry (transport failure or
//! 5xx) is a retryable error, distinguishable from not-found so the caller
//! can offer a retry.
//!
//! Validation runs on demand (checkout submit), not per keystroke, and
//! confirmed answers are cached for a few minutes so re-pricing the same
//! cart does not hit the registry again.

use std::time::Duration;

use moka::future::Cache;
use rotorparts_core::TaxProfile;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ViesConfig;

/// How long a registry answer stays valid for re-pricing the same checkout.
const CACHE_TTL: Duration = Duration::from_secs(600);

/// VIES country prefixes of EU member states (EL is Greece; XI is Northern
/// Ireland, still in the VAT area for goods).
const EU_MEMBER_PREFIXES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "EL", "ES", "FI", "FR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "XI",
];

/// Errors from VAT validation.
///
/// The first two are local validation failures (no network call was made);
/// `RegistryUnavailable` is retryable.
#[derive(Debug, Error)]
pub enum VatError {
    /// Empty or whitespace-only identifier.
    #[error("missing VAT identifier")]
    MissingIdentifier,

    /// Identifier does not start with a two-letter country prefix followed
    /// by a registry number.
    #[error("malformed VAT identifier: {0}")]
    MalformedPrefix(String),

    /// Registry unreachable, timed out, or answered with a server error.
    /// A 4xx answer is not this - that is a terminal invalid outcome.
    #[error("VAT registry unavailable: {0}")]
    RegistryUnavailable(String),
}

/// Client for the EU VAT registry check service.
#[derive(Clone)]
pub struct ViesClient {
    client: reqwest::Client,
    base_url: String,
    seller_country: String,
    cache: Cache<String, TaxProfile>,
}

/// Request body for the registry's check endpoint.
#[derive(Debug, serde::Serialize)]
struct CheckVatRequest<'a> {
    #[serde(rename = "countryCode")]
    country_code: &'a str,
    #[serde(rename = "vatNumber")]
    vat_number: &'a str,
}

/// Response body from the registry's check endpoint.
#[derive(Debug, Deserialize)]
struct CheckVatResponse {
    valid: bool,
    #[serde(default)]
    name: Option<String>,
}

impl ViesClient {
    /// Create a new registry client.
    #[must_use]
    pub fn new(config: &ViesConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            seller_country: config.seller_country.clone(),
            cache,
        }
    }

    /// Validate a VAT identifier and classify the exemption.
    ///
    /// A valid identifier from the seller's own country is not exempt -
    /// domestic B2B still pays VAT.
    ///
    /// # Errors
    ///
    /// - [`VatError::MissingIdentifier`] / [`VatError::MalformedPrefix`] for
    ///   input that never reaches the network.
    /// - [`VatError::RegistryUnavailable`] when the registry cannot answer;
    ///   the caller should surface a retry, never cache this.
    pub async fn validate(&self, vat_identifier: &str) -> Result<TaxProfile, VatError> {
        let normalized = normalize_identifier(vat_identifier);
        if normalized.is_empty() {
            return Err(VatError::MissingIdentifier);
        }

        let (prefix, number) = split_prefix(&normalized)?;

        if let Some(profile) = self.cache.get(&normalized).await {
            debug!(identifier = %normalized, "VAT validation served from cache");
            return Ok(profile);
        }

        let response = self.check_with_registry(prefix, number).await?;

        let is_intra_community = is_eu_prefix(prefix) && prefix != self.seller_country;
        let is_valid = response.valid;
        let profile = TaxProfile {
            vat_identifier: normalized.clone(),
            country_prefix: prefix.to_string(),
            is_valid,
            is_intra_community,
            exempt_from_vat: is_valid && is_intra_community,
            resolved_company_name: response.name.filter(|n| !n.trim().is_empty()),
            message: if is_valid {
                None
            } else {
                Some("unrecognized VAT number".to_string())
            },
        };

        self.cache.insert(normalized, profile.clone()).await;
        Ok(profile)
    }

    /// One outbound call to the registry check endpoint.
    async fn check_with_registry(
        &self,
        prefix: &str,
        number: &str,
    ) -> Result<CheckVatResponse, VatError> {
        let url = format!("{}/check-vat-number", self.base_url);
        let body = CheckVatRequest {
            country_code: prefix,
            vat_number: number,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "VAT registry request failed");
                VatError::RegistryUnavailable(e.to_string())
            })?;

        let status = response.status();
        // A 4xx is the registry answering "this lookup is no good"
        // (unsupported country code, malformed number) - a terminal invalid
        // outcome, not an outage. Only transport failures and 5xx are
        // retryable.
        if status.is_client_error() {
            warn!(status = %status, "VAT registry rejected the lookup");
            return Ok(CheckVatResponse {
                valid: false,
                name: None,
            });
        }
        if !status.is_success() {
            warn!(status = %status, "VAT registry returned non-success status");
            return Err(VatError::RegistryUnavailable(format!(
                "registry answered with status {status}"
            )));
        }

        response.json::<CheckVatResponse>().await.map_err(|e| {
            warn!(error = %e, "VAT registry response could not be parsed");
            VatError::RegistryUnavailable(e.to_string())
        })
    }
}

/// Trim and uppercase; registry numbers are case-insensitive on input.
fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Split "PL1234567890" into ("PL", "1234567890").
///
/// The prefix must be exactly two ASCII letters and the number part must be
/// non-empty. A well-formed prefix that happens not to be an EU member state
/// still passes here - the registry answers not-found and the profile comes
/// back non-intra-community.
fn split_prefix(identifier: &str) -> Result<(&str, &str), VatError> {
    let (prefix, number) = identifier
        .split_at_checked(2)
        .ok_or_else(|| VatError::MalformedPrefix(identifier.to_string()))?;

    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) || number.is_empty() {
        return Err(VatError::MalformedPrefix(identifier.to_string()));
    }

    Ok((prefix, number))
}

/// Whether the prefix denotes an EU member state in the VIES sense.
fn is_eu_prefix(prefix: &str) -> bool {
    EU_MEMBER_PREFIXES.contains(&prefix)
}

/// Pick the company name to show: the user's own entry wins, the registry's
/// resolved name only fills an empty field.
#[must_use]
pub fn merged_company_name(
    user_provided: Option<&str>,
    resolved: Option<&str>,
) -> Option<String> {
    match user_provided.map(str::trim) {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        _ => resolved.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize_identifier("  pl1234567890 "), "PL1234567890");
    }

    #[test]
    fn test_split_prefix_happy_path() {
        let (prefix, number) = split_prefix("ES12345678A").unwrap();
        assert_eq!(prefix, "ES");
        assert_eq!(number, "12345678A");
    }

    #[test]
    fn test_split_prefix_rejects_digits() {
        assert!(matches!(
            split_prefix("1234567890"),
            Err(VatError::MalformedPrefix(_))
        ));
    }

    #[test]
    fn test_split_prefix_rejects_bare_prefix() {
        assert!(matches!(
            split_prefix("PL"),
            Err(VatError::MalformedPrefix(_))
        ));
    }

    #[test]
    fn test_split_prefix_rejects_single_char() {
        assert!(matches!(
            split_prefix("P"),
            Err(VatError::MalformedPrefix(_))
        ));
    }

    #[test]
    fn test_non_eu_prefix_is_not_intra_community() {
        // "US" is syntactically fine; it goes to the registry and simply
        // never classifies as intra-community
        assert!(split_prefix("US123456789").is_ok());
        assert!(!is_eu_prefix("US"));
    }

    #[test]
    fn test_greece_uses_el_prefix() {
        assert!(is_eu_prefix("EL"));
        assert!(!is_eu_prefix("GR"));
    }

    #[test]
    fn test_merged_company_name_keeps_user_value() {
        let merged = merged_company_name(Some("My Own Name"), Some("Registry Name"));
        assert_eq!(merged.as_deref(), Some("My Own Name"));
    }

    #[test]
    fn test_merged_company_name_fills_empty_field() {
        let merged = merged_company_name(Some("   "), Some("Registry Name"));
        assert_eq!(merged.as_deref(), Some("Registry Name"));
        let merged = merged_company_name(None, Some("Registry Name"));
        assert_eq!(merged.as_deref(), Some("Registry Name"));
    }

    #[tokio::test]
    async fn test_empty_identifier_fails_without_network() {
        // Unroutable base URL: if validation tried the network this would
        // come back as RegistryUnavailable instead
        let client = ViesClient::new(&ViesConfig {
            base_url: "http://127.0.0.1:0".to_string(),
            seller_country: "PL".to_string(),
        });
        assert!(matches!(
            client.validate("   ").await,
            Err(VatError::MissingIdentifier)
        ));
        assert!(matches!(
            client.validate("99999").await,
            Err(VatError::MalformedPrefix(_))
        ));
    }

    /// One-shot registry stub: answers the first connection with a canned
    /// HTTP response and returns its base URL.
    async fn registry_stub(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> ViesClient {
        ViesClient::new(&ViesConfig {
            base_url,
            seller_country: "PL".to_string(),
        })
    }

    #[tokio::test]
    async fn test_registry_confirmation_classifies_exemption() {
        let base = registry_stub("200 OK", r#"{"valid":true,"name":"Example GmbH"}"#).await;

        let profile = client_for(base).validate("DE811569869").await.unwrap();

        assert!(profile.is_valid);
        assert!(profile.is_intra_community);
        assert!(profile.exempt_from_vat);
        assert_eq!(profile.resolved_company_name.as_deref(), Some("Example GmbH"));
    }

    #[tokio::test]
    async fn test_registry_rejection_is_invalid_not_retryable() {
        // A 4xx is the registry's answer, not an outage; the shopper must
        // not be told to retry forever
        let base = registry_stub("400 Bad Request", r#"{"error":"unsupported country"}"#).await;

        let profile = client_for(base).validate("US123456789").await.unwrap();

        assert!(!profile.is_valid);
        assert!(!profile.exempt_from_vat);
        assert_eq!(profile.message.as_deref(), Some("unrecognized VAT number"));
    }

    #[tokio::test]
    async fn test_registry_server_error_is_unavailable() {
        let base = registry_stub("500 Internal Server Error", "").await;

        let err = client_for(base).validate("DE811569869").await.unwrap_err();

        assert!(matches!(err, VatError::RegistryUnavailable(_)));
    }
}
