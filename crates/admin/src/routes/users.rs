//! User account route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use storedesk_core::listing::{ListQuery, filter_users, paginate};
use storedesk_core::{UserId, UserProfile, UserRole};
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, Loaded, PageNav, load_or_toast, mutation_failed};
use crate::components::data_table::{DataTableConfig, users_table_config};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// User row in the table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub email: String,
    pub phone: String,
    pub is_admin: bool,
    pub joined: String,
    /// The signed-in admin's own row cannot be deleted here.
    pub is_self: bool,
}

impl UserRow {
    fn new(user: &UserProfile, current: &UserId) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.display_name().to_owned(),
            initials: user.initials(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_else(|| "N/A".to_string()),
            is_admin: user.role == UserRole::Admin,
            joined: user
                .created_at
                .map_or_else(|| "N/A".to_string(), |d| d.format("%b %-d, %Y").to_string()),
            is_self: &user.id == current,
        }
    }
}

/// Users list page.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub layout: Layout,
    pub table: DataTableConfig,
    pub rows: Vec<UserRow>,
    pub nav: PageNav,
    pub search_value: String,
    pub role_value: String,
}

impl UsersIndexTemplate {
    fn filter_value(&self) -> &str {
        &self.role_value
    }
}

/// Users list page handler.
///
/// GET /users
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = state.stores().users.all(&admin.token).await;
    let users = match load_or_toast(
        &state,
        &session,
        &admin,
        result,
        "Failed to fetch users",
        Default::default,
    )
    .await
    {
        Loaded::Ready(users) => users,
        Loaded::Expired(response) => return response,
    };

    let matching = filter_users(&users, query.role_filter(), query.search_term());
    let page = paginate(
        matching,
        query.page(),
        state.config().pagination.users_per_page,
    );

    UsersIndexTemplate {
        layout: Layout::new(&state, &session, &admin, "/users").await,
        table: users_table_config(),
        rows: page
            .items
            .iter()
            .map(|u| UserRow::new(u, &admin.identity.id))
            .collect(),
        nav: PageNav::new("/users", &query, &page),
        search_value: query.search_term().unwrap_or_default().to_owned(),
        role_value: query
            .role_filter()
            .map(|r| r.as_str().to_owned())
            .unwrap_or_default(),
    }
    .into_response()
}

/// Delete a user account.
///
/// POST /users/{id}/delete
#[instrument(skip_all, fields(user_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Response {
    if id == admin.identity.id {
        flash::push(&session, Toast::error("You cannot delete your own account")).await;
        return Redirect::to("/users").into_response();
    }

    match state.stores().users.delete_user(&admin.token, &id).await {
        Ok(()) => {
            flash::push(&session, Toast::success("User deleted successfully")).await;
            Redirect::to("/users").into_response()
        }
        Err(e) => {
            mutation_failed(&state, &session, &admin, &e, "Failed to delete user", "/users").await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_row_marks_self_and_role() {
        let user: UserProfile = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Ada Obi",
            "email": "ada@shop.ng",
            "role": "admin",
            "createdAt": "2024-03-05T10:00:00Z"
        }))
        .unwrap();

        let row = UserRow::new(&user, &UserId::new("u1"));
        assert!(row.is_self);
        assert!(row.is_admin);
        assert_eq!(row.joined, "Mar 5, 2024");
        assert_eq!(row.phone, "N/A");

        let row = UserRow::new(&user, &UserId::new("u2"));
        assert!(!row.is_self);
    }
}
