//! Admin sign-in.

use reqwest::Method;
use serde::Deserialize;
use storedesk_core::UserProfile;
use storedesk_core::validation::Credentials;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// A successful admin login.
#[derive(Clone, Deserialize)]
pub struct LoginSession {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The signed-in user.
    pub user: UserProfile,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user.email)
            .finish()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    data: LoginSession,
}

impl ApiClient {
    /// Sign in with admin credentials.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, carrying
    /// the API's message.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginSession, ApiError> {
        let request = self
            .request(Method::POST, &["auth", "admin", "login"], None)?
            .json(credentials);
        let response: LoginResponse = self.send_json(request).await?;
        if response.data.token.is_empty() {
            return Err(ApiError::Parse("Login response has an empty token".to_string()));
        }
        tracing::info!(user_id = %response.data.user.id, "Admin signed in");
        Ok(response.data)
    }
}
