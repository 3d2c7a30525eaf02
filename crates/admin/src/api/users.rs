//! User and profile endpoints.

use reqwest::Method;
use serde::Deserialize;
use storedesk_core::{ProfileUpdate, UserId, UserProfile};
use tracing::instrument;

use super::{ApiClient, ApiError};

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserProfile>,
}

impl ApiClient {
    /// Fetch every user account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token))]
    pub async fn list_users(&self, token: &str) -> Result<Vec<UserProfile>, ApiError> {
        let request = self.request(Method::GET, &["users"], Some(token))?;
        let response: Envelope<UserList> = self.send_json(request).await?;
        Ok(response.data.users)
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token))]
    pub async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        let request = self.request(Method::GET, &["users", "profile"], Some(token))?;
        let response: Envelope<UserProfile> = self.send_json(request).await?;
        Ok(response.data)
    }

    /// Update the signed-in user's profile. Returns the stored profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .request(Method::PATCH, &["users", "profile"], Some(token))?
            .json(update);
        let response: Envelope<UserProfile> = self.send_json(request).await?;
        Ok(response.data)
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or API failure.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &str, id: &UserId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["users", id.as_str()], Some(token))?;
        self.send_optional_json(request).await?;
        Ok(())
    }
}
