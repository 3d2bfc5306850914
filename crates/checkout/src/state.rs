//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::CheckoutConfig;
use crate::services::{GeocodingClient, LockerDirectoryClient, LockerResolver, ViesClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration and the external
/// service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    vies: ViesClient,
    lockers: LockerResolver,
}

impl AppState {
    /// Create a new application state, wiring the service clients from
    /// configuration.
    #[must_use]
    pub fn new(config: CheckoutConfig) -> Self {
        let vies = ViesClient::new(&config.vies);
        let geocoder = GeocodingClient::new(&config.geocoder);
        let directory = LockerDirectoryClient::new(&config.lockers);
        let lockers = LockerResolver::new(geocoder, directory);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                vies,
                lockers,
            }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the VAT registry client.
    #[must_use]
    pub fn vies(&self) -> &ViesClient {
        &self.inner.vies
    }

    /// Get a reference to the locker resolver.
    #[must_use]
    pub fn lockers(&self) -> &LockerResolver {
        &self.inner.lockers
    }
}
