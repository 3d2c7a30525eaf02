//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::AdminConfig;
use crate::stores::Stores;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the API client and the per-session
/// stores built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: ApiClient,
    stores: Stores,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let stores = Stores::new(api.clone(), config.cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                stores,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the store API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.inner.api)
            .field("stores", &self.inner.stores)
            .finish_non_exhaustive()
    }
}
