//! Per-session state containers over the store API.
//!
//! Each store caches the collections it fetched for a signed-in session and
//! keeps that cache in step with successful mutations. Sessions are keyed by
//! a SHA-256 digest of their bearer token; the raw token is never a cache
//! key.
//!
//! # Failure policy
//!
//! A failed API call leaves the cache untouched and returns the error to the
//! handler, which turns it into a toast.
//!
//! # In-flight guard
//!
//! At most one mutation per (session, entity) runs at a time. A second one
//! fails fast with [`StoreError::Busy`] instead of issuing a duplicate
//! request.

mod orders;
mod products;
mod users;

pub use orders::OrderStore;
pub use products::ProductStore;
pub use users::UserStore;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};
use storedesk_core::validation::FieldErrors;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};

/// Upper bound on cached sessions per collection.
const MAX_CACHED_SESSIONS: u64 = 10_000;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Another mutation of the same entity is still running.
    #[error("Another update is already in progress")]
    Busy,

    /// The entity is not in the fetched collection.
    #[error("{0} not found")]
    NotFound(String),

    /// Input rejected before reaching the API.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
}

impl StoreError {
    /// Toast text for this failure.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(e) => e.user_message(fallback),
            Self::Busy => self.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Validation(errors) => errors
                .iter()
                .next()
                .map_or_else(|| fallback.to_owned(), |(_, message)| message.to_owned()),
        }
    }

    /// Whether the session's token was rejected.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_unauthorized())
    }
}

/// Cache key for one signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the key from a bearer token.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Set of (session, entity) pairs with a mutation in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<(SessionKey, String)>>>,
}

impl InFlight {
    /// Claim `entity` for `session`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` if the pair is already claimed.
    pub fn acquire(&self, session: &SessionKey, entity: String) -> Result<InFlightGuard, StoreError> {
        let key = (session.clone(), entity);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            tracing::debug!(entity = %key.1, "Rejected concurrent mutation");
            return Err(StoreError::Busy);
        }
        Ok(InFlightGuard {
            active: Arc::clone(&self.active),
            key: Some(key),
        })
    }

    /// Whether `entity` is currently claimed for `session`.
    #[must_use]
    pub fn is_busy(&self, session: &SessionKey, entity: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(session.clone(), entity.to_owned()))
    }
}

/// Releases its claim when dropped, whether the request succeeded or not.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<(SessionKey, String)>>>,
    key: Option<(SessionKey, String)>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
        }
    }
}

fn build_cache<V>(ttl: Duration) -> moka::future::Cache<SessionKey, Arc<V>>
where
    V: Send + Sync + 'static,
{
    moka::future::Cache::builder()
        .max_capacity(MAX_CACHED_SESSIONS)
        .time_to_live(ttl)
        .build()
}

/// All stores, shared by every request.
#[derive(Clone, Debug)]
pub struct Stores {
    pub products: ProductStore,
    pub orders: OrderStore,
    pub users: UserStore,
}

impl Stores {
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let in_flight = InFlight::default();
        Self {
            products: ProductStore::new(api.clone(), ttl, in_flight.clone()),
            orders: OrderStore::new(api.clone(), ttl, in_flight.clone()),
            users: UserStore::new(api, ttl, in_flight),
        }
    }

    /// Drop everything cached for `token` (used on sign-out).
    pub async fn invalidate(&self, token: &str) {
        self.products.invalidate(token).await;
        self.orders.invalidate(token).await;
        self.users.invalidate(token).await;
    }
}
