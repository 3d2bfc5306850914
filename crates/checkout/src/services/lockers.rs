//! Parcel locker resolution from free-text input.
//!
//! One search invocation walks an explicit, ordered chain of strategies:
//!
//! 1. **Proximity** - geocode the raw query; if it resolves, ask the locker
//!    directory for operating lockers around that point and sort ascending
//!    by distance.
//! 2. **Locality fallback** - when geocoding fails or the proximity search
//!    comes back empty, classify the query as a postal code
//!    (`\d{2}[- ]?\d{3}`) or a city name (first token) and query the
//!    directory by locality instead. These results carry no distance.
//!
//! The first strategy that yields candidates wins; if none does, the search
//! resolves to an empty list ("no lockers found"), not an error. Queries
//! under 3 characters are rejected locally with zero network calls.
//!
//! Overlapping searches within one search session are guarded by a
//! per-session [`RequestSequencer`]: only the session's latest-issued
//! search may commit its results, stale completions surface as
//! [`LockerError::Superseded`] and are dropped by the caller. Sessions are
//! independent - one shopper's search never supersedes another's.
//!
//! [`RequestSequencer`]: crate::services::sequence::RequestSequencer

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use rotorparts_core::{Coordinates, LockerCandidate};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LockerApiConfig;
use crate::services::geocoding::GeocodingClient;
use crate::services::sequence::SessionSequencers;

/// Queries shorter than this never reach the network.
const MIN_QUERY_LEN: usize = 3;

/// Upper bound on candidates returned from one search.
const MAX_RESULTS: usize = 15;

/// Radius for the proximity search, in meters.
const PROXIMITY_RADIUS_M: u32 = 10_000;

/// Polish postal code: two digits, three digits, optional separator.
static POSTAL_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // pattern is a literal, checked by tests
    let re = Regex::new(r"^\d{2}[-\s]?\d{3}$").unwrap();
    re
});

/// Errors from locker resolution.
#[derive(Debug, Error)]
pub enum LockerError {
    /// Locker directory unreachable, timed out, or answered with a server
    /// error. Retryable.
    #[error("locker directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// A newer search was issued while this one was in flight; its results
    /// must not be applied.
    #[error("search superseded by a newer query")]
    Superseded,
}

// =============================================================================
// Directory client
// =============================================================================

/// Lookup seams, so the resolver's fallback policy is testable without a
/// live directory.
pub trait LockerDirectory {
    /// Operating lockers around a point, with distances.
    fn find_nearby(
        &self,
        point: Coordinates,
    ) -> impl Future<Output = Result<Vec<LockerCandidate>, LockerError>> + Send;

    /// Operating lockers with an exact postal code, no distances.
    fn find_by_postal_code(
        &self,
        postal_code: &str,
    ) -> impl Future<Output = Result<Vec<LockerCandidate>, LockerError>> + Send;

    /// Operating lockers in a named city, no distances.
    fn find_by_city(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<Vec<LockerCandidate>, LockerError>> + Send;
}

/// Geocoding seam for the resolver.
pub trait Geocoder {
    /// Best-match coordinates for free text, `None` meaning "fall through".
    fn geocode(&self, address_text: &str) -> impl Future<Output = Option<Coordinates>> + Send;
}

impl Geocoder for GeocodingClient {
    async fn geocode(&self, address_text: &str) -> Option<Coordinates> {
        Self::geocode(self, address_text).await
    }
}

/// Client for the parcel locker directory API.
#[derive(Clone)]
pub struct LockerDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

/// Paged points response from the directory.
#[derive(Debug, Deserialize)]
struct PointsResponse {
    #[serde(default)]
    items: Vec<PointRow>,
}

/// One point row from the directory.
#[derive(Debug, Deserialize)]
struct PointRow {
    name: String,
    address_details: AddressDetails,
    #[serde(default)]
    location_description: Option<String>,
    /// Meters from the relative point; present only on proximity queries.
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AddressDetails {
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    building_number: Option<String>,
    city: String,
    post_code: String,
}

impl LockerDirectoryClient {
    /// Create a new directory client.
    #[must_use]
    pub fn new(config: &LockerApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config
                .api_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        }
    }

    /// Fetch one page of points with the given query parameters.
    async fn fetch_points(&self, params: &[(&str, String)]) -> Result<Vec<PointRow>, LockerError> {
        let query: String = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/v1/points?{}", self.base_url, query);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "locker directory request failed");
            LockerError::DirectoryUnavailable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "locker directory returned non-success status");
            return Err(LockerError::DirectoryUnavailable(format!(
                "directory answered with status {status}"
            )));
        }

        let page: PointsResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "locker directory response could not be parsed");
            LockerError::DirectoryUnavailable(e.to_string())
        })?;

        Ok(page.items)
    }

    fn common_params() -> Vec<(&'static str, String)> {
        vec![
            ("type", "parcel_locker".to_string()),
            ("status", "Operating".to_string()),
            ("per_page", MAX_RESULTS.to_string()),
        ]
    }
}

impl LockerDirectory for LockerDirectoryClient {
    async fn find_nearby(
        &self,
        point: Coordinates,
    ) -> Result<Vec<LockerCandidate>, LockerError> {
        let mut params = Self::common_params();
        params.push(("relative_point", format!("{},{}", point.lat, point.lon)));
        params.push(("max_distance", PROXIMITY_RADIUS_M.to_string()));
        params.push(("sort_by", "distance_to_relative_point".to_string()));

        let rows = self.fetch_points(&params).await?;
        Ok(rows.into_iter().map(candidate_from_row).collect())
    }

    async fn find_by_postal_code(
        &self,
        postal_code: &str,
    ) -> Result<Vec<LockerCandidate>, LockerError> {
        let mut params = Self::common_params();
        params.push(("post_code", postal_code.to_string()));

        let rows = self.fetch_points(&params).await?;
        Ok(rows.into_iter().map(strip_distance).map(candidate_from_row).collect())
    }

    async fn find_by_city(&self, city: &str) -> Result<Vec<LockerCandidate>, LockerError> {
        let mut params = Self::common_params();
        params.push(("city", city.to_string()));

        let rows = self.fetch_points(&params).await?;
        Ok(rows.into_iter().map(strip_distance).map(candidate_from_row).collect())
    }
}

/// Locality lookups carry no meaningful distance even if the API echoes one.
fn strip_distance(mut row: PointRow) -> PointRow {
    row.distance = None;
    row
}

fn candidate_from_row(row: PointRow) -> LockerCandidate {
    let street_address = match (row.address_details.street, row.address_details.building_number) {
        (Some(street), Some(number)) => format!("{street} {number}"),
        (Some(street), None) => street,
        (None, Some(number)) => number,
        (None, None) => String::new(),
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let distance_meters = row.distance.map(|d| d.round().max(0.0) as u32);

    LockerCandidate {
        id: row.name,
        street_address,
        city: row.address_details.city,
        postal_code: row.address_details.post_code,
        description: row.location_description.filter(|d| !d.trim().is_empty()),
        distance_meters,
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A named step in the fallback chain, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Geocode the raw query, then search the directory by proximity.
    Proximity,
    /// Exact postal-code lookup.
    PostalCode,
    /// First-token city-name lookup.
    CityName,
}

/// Resolves a free-text query to an ordered list of locker candidates.
///
/// Generic over its two collaborators so the fallback policy can be tested
/// with canned lookups; production wiring uses [`GeocodingClient`] and
/// [`LockerDirectoryClient`].
pub struct LockerResolver<G = GeocodingClient, D = LockerDirectoryClient> {
    geocoder: G,
    directory: D,
    sequencers: SessionSequencers,
}

impl<G: Geocoder, D: LockerDirectory> LockerResolver<G, D> {
    /// Create a resolver over the given collaborators.
    #[must_use]
    pub fn new(geocoder: G, directory: D) -> Self {
        Self {
            geocoder,
            directory,
            sequencers: SessionSequencers::new(),
        }
    }

    /// The ordered strategy chain for a query: proximity first, then the
    /// locality fallback the query's shape calls for.
    #[must_use]
    pub fn strategy_chain(query: &str) -> [SearchStrategy; 2] {
        if POSTAL_CODE_RE.is_match(query) {
            [SearchStrategy::Proximity, SearchStrategy::PostalCode]
        } else {
            [SearchStrategy::Proximity, SearchStrategy::CityName]
        }
    }

    /// Run one search: a fresh lookup, finite list, at most
    /// [`MAX_RESULTS`] candidates.
    ///
    /// Queries shorter than 3 characters (after trimming) resolve to an
    /// empty list immediately, with zero network calls. An exhausted
    /// strategy chain also resolves to an empty list - "no lockers found
    /// for this query" is an outcome, not an error.
    ///
    /// `session` scopes latest-wins sequencing to one shopper's search box:
    /// within a session only the newest in-flight search may commit.
    /// Searches without a session token are never superseded.
    ///
    /// # Errors
    ///
    /// - [`LockerError::DirectoryUnavailable`] when the directory cannot
    ///   answer (retryable).
    /// - [`LockerError::Superseded`] when a newer search started in the
    ///   same session while this one was in flight; the result must be
    ///   discarded.
    pub async fn search(
        &self,
        session: Option<&str>,
        query: &str,
    ) -> Result<Vec<LockerCandidate>, LockerError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            debug!(query, "locker query below minimum length, skipping lookup");
            return Ok(Vec::new());
        }

        let guard = session.map(|token| {
            let sequencer = self.sequencers.for_session(token);
            let seq = sequencer.begin();
            (sequencer, seq)
        });

        let mut found = None;
        for strategy in Self::strategy_chain(query) {
            if let Some(candidates) = self.run_strategy(strategy, query).await? {
                debug!(query, ?strategy, count = candidates.len(), "locker strategy matched");
                found = Some(candidates);
                break;
            }
        }

        if let Some((sequencer, seq)) = guard {
            if !sequencer.try_commit(seq) {
                debug!(query, "dropping superseded locker search result");
                return Err(LockerError::Superseded);
            }
        }

        Ok(dedup_and_cap(found.unwrap_or_default()))
    }

    /// Run one strategy; `Ok(None)` means it yielded nothing and the chain
    /// falls through.
    async fn run_strategy(
        &self,
        strategy: SearchStrategy,
        query: &str,
    ) -> Result<Option<Vec<LockerCandidate>>, LockerError> {
        let candidates = match strategy {
            SearchStrategy::Proximity => {
                let Some(point) = self.geocoder.geocode(query).await else {
                    return Ok(None);
                };
                let mut candidates = self.directory.find_nearby(point).await?;
                candidates.sort_by_key(|c| c.distance_meters.unwrap_or(u32::MAX));
                candidates
            }
            SearchStrategy::PostalCode => {
                self.directory
                    .find_by_postal_code(&normalize_postal_code(query))
                    .await?
            }
            SearchStrategy::CityName => {
                let Some(city) = first_token(query) else {
                    return Ok(None);
                };
                self.directory.find_by_city(city).await?
            }
        };

        Ok(if candidates.is_empty() {
            None
        } else {
            Some(candidates)
        })
    }
}

/// Canonical dashed form, "44200" / "44 200" -> "44-200".
fn normalize_postal_code(query: &str) -> String {
    let digits: String = query.chars().filter(char::is_ascii_digit).collect();
    match digits.split_at_checked(2) {
        Some((head, tail)) => format!("{head}-{tail}"),
        None => query.to_string(),
    }
}

/// First comma/whitespace-separated token of the query.
fn first_token(query: &str) -> Option<&str> {
    query
        .split([',', ' '])
        .map(str::trim)
        .find(|token| !token.is_empty())
}

/// Deduplicate by locker id, preserving order, and cap the list.
fn dedup_and_cap(candidates: Vec<LockerCandidate>) -> Vec<LockerCandidate> {
    let mut seen = HashSet::new();
    let mut unique: Vec<LockerCandidate> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect();
    unique.truncate(MAX_RESULTS);
    unique
}
