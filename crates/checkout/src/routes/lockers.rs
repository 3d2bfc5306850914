//! Locker search route handler.
//!
//! The client debounces typing (~500ms of inactivity) before calling this;
//! the resolver's per-session sequencing additionally drops any search that
//! was superseded by a newer one from the same session while in flight, so
//! stale results are never rendered over a newer query's.

use axum::{
    Json,
    extract::{Query, State},
};
use rotorparts_core::LockerCandidate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::services::lockers::LockerError;
use crate::state::AppState;

/// Locker search query parameters.
#[derive(Debug, Deserialize)]
pub struct LockerSearchParams {
    /// Free-text query: street address, city, or postal code.
    pub q: String,
    /// Search session token from the client. Overlapping searches within
    /// one session are resolved latest-wins; searches from different
    /// sessions never affect each other. Absent means no sequencing.
    #[serde(default)]
    pub session: Option<String>,
}

/// Locker search response.
#[derive(Debug, Serialize)]
pub struct LockerSearchResponse {
    pub query: String,
    /// Ordered candidates; empty means "no lockers found for this query".
    pub candidates: Vec<LockerCandidate>,
    /// Set when this search was superseded by a newer one and its results
    /// were dropped; the client should keep the newer results.
    pub stale: bool,
}

/// Resolve locker candidates for a free-text query.
#[instrument(skip(state), fields(query = %params.q))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<LockerSearchParams>,
) -> Result<Json<LockerSearchResponse>> {
    match state.lockers().search(params.session.as_deref(), &params.q).await {
        Ok(candidates) => Ok(Json(LockerSearchResponse {
            query: params.q,
            candidates,
            stale: false,
        })),
        Err(LockerError::Superseded) => Ok(Json(LockerSearchResponse {
            query: params.q,
            candidates: Vec::new(),
            stale: true,
        })),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;

    #[tokio::test]
    async fn test_short_query_answers_empty_without_upstreams() {
        // Default config points at real hosts, but a 2-char query must never
        // reach them
        let state = AppState::new(CheckoutConfig::from_env().unwrap());
        let params = LockerSearchParams {
            q: "Sm".to_string(),
            session: Some("shopper-a".to_string()),
        };

        let Json(response) = search(State(state), Query(params)).await.unwrap();

        assert!(response.candidates.is_empty());
        assert!(!response.stale);
    }
}
