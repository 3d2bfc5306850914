//! VAT validation route handler.
//!
//! One registry lookup per call; the client triggers this on demand (field
//! blur or checkout submit), never per keystroke. The response carries the
//! tax profile to feed back into `/api/checkout/quote` plus the effective
//! company name - the registry's name fills an empty field but never
//! overwrites what the shopper typed.

use axum::{Json, extract::State};
use rotorparts_core::TaxProfile;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::services::vat::merged_company_name;
use crate::state::AppState;

/// VAT validation request payload.
#[derive(Debug, Deserialize)]
pub struct ValidateVatRequest {
    pub vat_identifier: String,
    /// Company name already entered by the shopper, if any.
    #[serde(default)]
    pub company_name: Option<String>,
}

/// VAT validation response.
#[derive(Debug, Serialize)]
pub struct ValidateVatResponse {
    #[serde(flatten)]
    pub profile: TaxProfile,
    /// Name to show in the company field after this validation.
    pub company_name: Option<String>,
}

/// Validate a VAT identifier against the EU registry.
#[instrument(skip(state, request))]
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateVatRequest>,
) -> Result<Json<ValidateVatResponse>> {
    let profile = state.vies().validate(&request.vat_identifier).await?;

    let company_name = merged_company_name(
        request.company_name.as_deref(),
        profile.resolved_company_name.as_deref(),
    );

    Ok(Json(ValidateVatResponse {
        profile,
        company_name,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_flattens_profile() {
        let response = ValidateVatResponse {
            profile: TaxProfile {
                vat_identifier: "DE811569869".to_string(),
                country_prefix: "DE".to_string(),
                is_valid: true,
                is_intra_community: true,
                exempt_from_vat: true,
                resolved_company_name: Some("Example GmbH".to_string()),
                message: None,
            },
            company_name: Some("Example GmbH".to_string()),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["exempt_from_vat"], true);
        assert_eq!(json["company_name"], "Example GmbH");
    }
}
