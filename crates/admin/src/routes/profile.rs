//! Profile route handlers for the signed-in admin.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use storedesk_core::UserProfile;
use storedesk_core::validation::{FieldErrors, ProfileForm};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, mutation_failed};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{RequireAdminAuth, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Profile fields as displayed.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub name: String,
    pub initials: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
    pub role: String,
    pub member_since: String,
    pub picture: Option<String>,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        let or_missing = |value: Option<&String>| {
            value.map_or_else(|| "Not provided".to_string(), Clone::clone)
        };
        Self {
            name: profile.display_name().to_owned(),
            initials: profile.initials(),
            email: profile.email.clone(),
            phone: or_missing(profile.phone.as_ref()),
            gender: or_missing(profile.gender.as_ref()),
            address: profile.display_address(),
            role: profile.role.to_string(),
            member_since: profile
                .created_at
                .map_or_else(|| "N/A".to_string(), |d| d.format("%B %Y").to_string()),
            picture: profile.profile_picture.clone(),
        }
    }
}

/// Profile page.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
}

/// Edit profile form.
#[derive(Template, WebTemplate)]
#[template(path = "profile/edit.html")]
pub struct ProfileEditTemplate {
    pub layout: Layout,
    pub form: ProfileForm,
    pub errors: FieldErrors,
}

async fn load_profile(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<Arc<UserProfile>, Response> {
    match state.stores().users.profile(&admin.token).await {
        Ok(profile) => Ok(profile),
        Err(e) => Err(mutation_failed(state, session, admin, &e, "Failed to fetch profile", "/").await),
    }
}

/// Show the signed-in admin's profile.
///
/// GET /profile
#[instrument(skip_all)]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    let profile = match load_profile(&state, &session, &admin).await {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    ProfileTemplate {
        layout: Layout::new(&state, &session, &admin, "/profile").await,
        profile: ProfileView::from(profile.as_ref()),
    }
    .into_response()
}

/// Edit profile form, pre-filled from the cached profile.
///
/// GET /profile/edit
#[instrument(skip_all)]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    let profile = match load_profile(&state, &session, &admin).await {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    ProfileEditTemplate {
        layout: Layout::new(&state, &session, &admin, "/profile").await,
        form: ProfileForm::from_profile(&profile),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Update the profile.
///
/// POST /profile
#[instrument(skip_all)]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Response {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                ProfileEditTemplate {
                    layout: Layout::new(&state, &session, &admin, "/profile").await,
                    form,
                    errors,
                },
            )
                .into_response();
        }
    };

    match state.stores().users.update_profile(&admin.token, &update).await {
        Ok(profile) => {
            // Keep the header in step with the new name and email.
            let mut refreshed = admin.clone();
            refreshed.identity.name.clone_from(&profile.name);
            refreshed.identity.email.clone_from(&profile.email);
            if let Err(e) = set_current_admin(&session, &refreshed).await {
                tracing::warn!(error = %e, "Failed to refresh session identity");
            }
            flash::push(&session, Toast::success("Profile updated successfully")).await;
            Redirect::to("/profile").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to update profile", "/profile/edit")
                .await
        }
    }
}
