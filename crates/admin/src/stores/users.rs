//! User accounts and the signed-in profile.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storedesk_core::{ProfileUpdate, UserId, UserProfile};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{InFlight, SessionKey, StoreError, build_cache};
use crate::api::ApiClient;

#[derive(Clone)]
pub struct UserStore {
    api: ApiClient,
    users: Cache<SessionKey, Arc<Vec<UserProfile>>>,
    profiles: Cache<SessionKey, Arc<UserProfile>>,
    in_flight: InFlight,
    write: Arc<Mutex<()>>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("cached_sessions", &self.users.entry_count())
            .finish_non_exhaustive()
    }
}

impl UserStore {
    pub(super) fn new(api: ApiClient, ttl: Duration, in_flight: InFlight) -> Self {
        Self {
            api,
            users: build_cache(ttl),
            profiles: build_cache(ttl),
            in_flight,
            write: Arc::new(Mutex::new(())),
        }
    }

    /// All user accounts.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails.
    pub async fn all(&self, token: &str) -> Result<Arc<Vec<UserProfile>>, StoreError> {
        let key = SessionKey::from_token(token);
        if let Some(users) = self.users.get(&key).await {
            return Ok(users);
        }
        let users = Arc::new(self.api.list_users(token).await?);
        self.users.insert(key, Arc::clone(&users)).await;
        Ok(users)
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the fetch fails.
    pub async fn profile(&self, token: &str) -> Result<Arc<UserProfile>, StoreError> {
        let key = SessionKey::from_token(token);
        if let Some(profile) = self.profiles.get(&key).await {
            return Ok(profile);
        }
        let profile = Arc::new(self.api.get_profile(token).await?);
        self.profiles.insert(key, Arc::clone(&profile)).await;
        Ok(profile)
    }

    /// Update the profile and cache what the API returned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip_all)]
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Arc<UserProfile>, StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, "profile".to_string())?;

        let profile = Arc::new(self.api.update_profile(token, update).await?);
        self.profiles.insert(key.clone(), Arc::clone(&profile)).await;

        // Keep the users table consistent with the new profile.
        let _write = self.write.lock().await;
        if let Some(current) = self.users.get(&key).await {
            let updated: Vec<UserProfile> = current
                .iter()
                .map(|u| if u.id == profile.id { (*profile).clone() } else { u.clone() })
                .collect();
            self.users.insert(key, Arc::new(updated)).await;
        }
        tracing::info!(user_id = %profile.id, "Profile updated");
        Ok(profile)
    }

    /// Delete a user account and drop it from the cached list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Busy` or `Api`.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &str, id: &UserId) -> Result<(), StoreError> {
        let key = SessionKey::from_token(token);
        let _guard = self.in_flight.acquire(&key, format!("user:{id}"))?;

        self.api.delete_user(token, id).await?;

        let _write = self.write.lock().await;
        if let Some(current) = self.users.get(&key).await {
            let remaining: Vec<UserProfile> =
                current.iter().filter(|u| &u.id != id).cloned().collect();
            self.users.insert(key, Arc::new(remaining)).await;
        }
        tracing::info!("User deleted");
        Ok(())
    }

    /// Forget this session's cached users and profile.
    pub async fn invalidate(&self, token: &str) {
        let key = SessionKey::from_token(token);
        self.users.invalidate(&key).await;
        self.profiles.invalidate(&key).await;
    }
}
