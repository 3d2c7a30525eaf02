//! Session-backed admin extractors.
//!
//! Login stores a [`CurrentAdmin`] (bearer token plus identity) in the
//! session. Page handlers take [`RequireAdminAuth`]; the login page takes
//! [`OptionalAdminAuth`] so it can bounce signed-in admins to the dashboard.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// The signed-in admin, or a rejection.
///
/// Pages redirect to `/auth/login`; `/api/*` answers 401 instead.
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Why [`RequireAdminAuth`] refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    RedirectToLogin,
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Whether the request targets the JSON endpoints.
///
/// Nested routers strip their prefix from `parts.uri`, so the original URI
/// is checked first.
fn is_json_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
        .path()
        .starts_with("/api/")
}

/// The admin stored in this request's session, if any.
async fn session_admin(parts: &Parts) -> Option<CurrentAdmin> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentAdmin>(session_keys::CURRENT_ADMIN).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable admin session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(admin) = session_admin(parts).await else {
            return Err(if is_json_request(parts) {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            });
        };
        tracing::Span::current().record("admin_id", admin.identity.id.as_str());
        Ok(Self(admin))
    }
}

/// The signed-in admin when there is one; never rejects.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_admin(parts).await))
    }
}

/// Store the admin after login or a profile change.
///
/// Cycles the session id first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Forget the admin, keeping the session itself so queued toasts survive.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str) -> Parts {
        Request::get(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_json_requests_detected_from_original_uri() {
        assert!(is_json_request(&parts("/api/products")));
        assert!(!is_json_request(&parts("/products")));

        let mut nested = parts("/products");
        nested
            .extensions
            .insert(OriginalUri("/api/products".parse().unwrap()));
        assert!(is_json_request(&nested));
    }
}
