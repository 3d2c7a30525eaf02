//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};
use storedesk_core::{AdminIdentity, UserRole};

/// Session-stored admin identity.
///
/// Holds the bearer token issued at login; every store call made on behalf
/// of this admin uses it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Bearer token for the store API.
    pub token: String,
    /// Who signed in.
    pub identity: AdminIdentity,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(token: impl Into<String>, identity: AdminIdentity) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }

    /// Display name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.identity.name.trim().is_empty() {
            &self.identity.email
        } else {
            &self.identity.name
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.role == UserRole::Admin
    }
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for queued toast notifications.
    pub const TOASTS: &str = "toasts";
}
