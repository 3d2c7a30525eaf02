//! Authentication route handlers for admin.
//!
//! Admins sign in with email and password against the store API; the bearer
//! token it returns is kept in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use storedesk_core::AdminIdentity;
use storedesk_core::validation::{FieldErrors, LoginForm};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{OptionalAdminAuth, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub errors: FieldErrors,
    pub toasts: Vec<Toast>,
}

/// Display the login page.
///
/// GET /auth/login
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        email: String::new(),
        errors: FieldErrors::new(),
        toasts: flash::drain(&session).await,
    }
    .into_response()
}

/// Handle login form submission.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return LoginTemplate {
                email: form.email,
                errors,
                toasts: Vec::new(),
            }
            .into_response();
        }
    };

    let login = match state.api().login(&credentials).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return LoginTemplate {
                email: form.email,
                errors: FieldErrors::new(),
                toasts: vec![Toast::error(e.user_message("An error occurred"))],
            }
            .into_response();
        }
    };

    let identity = AdminIdentity::from(login.user);
    let admin = CurrentAdmin::new(login.token, identity);

    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to set session");
        return LoginTemplate {
            email: form.email,
            errors: FieldErrors::new(),
            toasts: vec![Toast::error("An error occurred")],
        }
        .into_response();
    }

    set_sentry_user(admin.identity.id.as_str(), Some(&admin.identity.email));
    flash::push(&session, Toast::success("Login Successful")).await;
    Redirect::to("/").into_response()
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
) -> Response {
    if let Some(admin) = admin {
        state.stores().invalidate(&admin.token).await;
        tracing::info!(user_id = %admin.identity.id, "Admin signed out");
    }
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session on logout");
    }
    clear_sentry_user();

    Redirect::to("/auth/login").into_response()
}
