//! Unified error handling for the checkout API.
//!
//! Route handlers return `Result<T, AppError>`. The taxonomy mirrors how
//! failures are reported to the shopper:
//!
//! - local validation problems (empty VAT id, malformed prefix, bad request
//!   payloads) are 400s and never logged as system faults;
//! - upstream unavailability (VAT registry, locker directory) is a 502 with
//!   a retryable message, distinct from "not found";
//! - "not found" outcomes (unrecognized VAT number, no lockers for a query)
//!   are not errors at all - handlers return them as ordinary bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::lockers::LockerError;
use crate::services::vat::VatError;

/// Application-level error type for the checkout service.
#[derive(Debug, Error)]
pub enum AppError {
    /// VAT validation failed.
    #[error("VAT error: {0}")]
    Vat(#[from] VatError),

    /// Locker search failed.
    #[error("Locker error: {0}")]
    Locker(#[from] LockerError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to the client.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Internal(_)
                | Self::Vat(VatError::RegistryUnavailable(_))
                | Self::Locker(LockerError::DirectoryUnavailable(_))
        ) {
            tracing::error!(error = %self, "Request error");
        }

        let (status, message, retryable) = match &self {
            Self::Vat(VatError::MissingIdentifier | VatError::MalformedPrefix(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string(), false)
            }
            Self::Vat(VatError::RegistryUnavailable(_)) => (
                StatusCode::BAD_GATEWAY,
                "VAT validation failed, try again".to_string(),
                true,
            ),
            Self::Locker(LockerError::DirectoryUnavailable(_)) => (
                StatusCode::BAD_GATEWAY,
                "Locker search failed, try again".to_string(),
                true,
            ),
            // A superseded search should be filtered by the handler; if one
            // leaks here, tell the client to re-issue the latest query.
            Self::Locker(LockerError::Superseded) => (
                StatusCode::CONFLICT,
                "Search superseded by a newer query".to_string(),
                true,
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone(), false),
            // Don't expose internal error details to clients
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                false,
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                retryable,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
