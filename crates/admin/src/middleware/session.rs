//! Session middleware configuration for admin.
//!
//! Sessions live in memory: they hold only the API bearer token and queued
//! toasts, both of which are cheap to lose on restart. The cookie is signed
//! with a key derived from `ADMIN_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "storedesk_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &AdminConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

/// Stretch the configured secret to the 64 bytes a cookie key needs.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let a = signing_key(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"));
        let b = signing_key(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"));
        let c = signing_key(&SecretString::from("zZ3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"));
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }
}
