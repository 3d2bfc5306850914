//! Free-text address geocoding.
//!
//! Wraps a Nominatim-compatible search endpoint. The adapter takes the
//! single best match inside the configured country and collapses every
//! failure mode - empty input, no match, network error, bad payload - into
//! `None`. Callers treat `None` as "fall through to the next resolution
//! strategy", never as a hard failure.

use rotorparts_core::Coordinates;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeocoderConfig;

/// Country qualifier sent with every lookup; lockers are resolved
/// domestically only.
const COUNTRY_CODES: &str = "pl";

/// Client for the geocoding lookup.
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

/// One row of a Nominatim search response. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct GeocodeRow {
    lat: String,
    lon: String,
}

impl GeocodingClient {
    /// Create a new geocoding client.
    #[must_use]
    pub fn new(config: &GeocoderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Resolve free text to coordinates, best match only.
    ///
    /// Returns `None` on empty input, no match, or any transport/parse
    /// failure. Failures are logged and swallowed by design.
    pub async fn geocode(&self, address_text: &str) -> Option<Coordinates> {
        let query = address_text.trim();
        if query.is_empty() {
            return None;
        }

        let url = format!(
            "{}/search?q={}&countrycodes={}&format=jsonv2&limit=1",
            self.base_url,
            urlencoding::encode(query),
            COUNTRY_CODES
        );

        let response = match self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "geocoder request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "geocoder returned non-success status");
            return None;
        }

        let rows: Vec<GeocodeRow> = match response.json().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "geocoder response could not be parsed");
                return None;
            }
        };

        let best = rows.into_iter().next()?;
        match (best.lat.parse::<f64>(), best.lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => {
                debug!(query, lat, lon, "geocoded query");
                Some(Coordinates { lat, lon })
            }
            _ => {
                warn!(query, "geocoder returned unparsable coordinates");
                None
            }
        }
    }
}
