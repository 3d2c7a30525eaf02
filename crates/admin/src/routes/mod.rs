//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Sign in with email and password
//! POST /auth/logout               - Sign out
//!
//! # Dashboard
//! GET  /                          - Dashboard overview
//!
//! # Products
//! GET  /products                  - Product table
//! GET  /products/new              - Add-product form
//! POST /products                  - Create product (multipart)
//! POST /products/refresh          - Re-fetch the product list
//! GET  /products/{id}             - Product detail
//! POST /products/{id}             - Update product fields
//! GET  /products/{id}/edit        - Edit form
//! GET  /products/{id}/images      - Image manager
//! POST /products/{id}/images      - Replace image set (multipart)
//! GET  /products/{id}/delete      - Delete confirmation
//! POST /products/{id}/delete      - Delete product
//!
//! # Orders
//! GET  /orders                    - Order table
//! GET  /orders/new                - Add-order form
//! POST /orders                    - Create order
//! POST /orders/{id}/delivery      - Set delivery status
//! POST /orders/{id}/payment       - Set payment status
//! POST /orders/{id}/delete        - Delete order
//!
//! # Profile & users
//! GET  /profile                   - Signed-in user's profile
//! GET  /profile/edit              - Edit profile form
//! POST /profile                   - Update profile
//! GET  /users                     - User table
//! POST /users/{id}/delete         - Delete user
//!
//! # JSON
//! GET  /api/products              - Cached product list
//! GET  /api/orders                - Cached order list
//! ```
//!
//! Mutating handlers follow post/redirect/get: validate, call the store,
//! queue a toast, redirect. Validation failures re-render the form with the
//! submitted values and per-field messages.

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod profile;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use storedesk_core::CurrencyCode;
use storedesk_core::listing::{ListQuery, Page};
use tower_sessions::Session;

use crate::error::clear_sentry_user;
use crate::flash::{self, Toast};
use crate::middleware::clear_current_admin;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::stores::StoreError;

/// Largest accepted multipart body: six images plus form fields.
const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;

/// Toast shown when the API rejects the session's token.
pub const SESSION_EXPIRED: &str = "Your session has expired";

// =============================================================================
// Layout
// =============================================================================

/// Signed-in admin as shown in the header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub initials: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        let name = admin.display_name().to_owned();
        let initials = name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        Self {
            name,
            email: admin.identity.email.clone(),
            initials,
        }
    }
}

/// Data every signed-in page template needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin: AdminUserView,
    pub current_path: &'static str,
    pub toasts: Vec<Toast>,
    pub currency: CurrencyCode,
}

impl Layout {
    /// Build the layout, draining queued toasts.
    pub async fn new(
        state: &AppState,
        session: &Session,
        admin: &CurrentAdmin,
        current_path: &'static str,
    ) -> Self {
        Self {
            admin: AdminUserView::from(admin),
            current_path,
            toasts: flash::drain(session).await,
            currency: state.config().currency,
        }
    }

    /// Whether a nav entry is the active section.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        if path == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(path)
        }
    }
}

// =============================================================================
// Failure handling
// =============================================================================

/// Sign the admin out after the API rejected their token.
pub async fn expire_session(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
) -> Response {
    tracing::info!(user_id = %admin.identity.id, "API rejected session token");
    state.stores().invalidate(&admin.token).await;
    if let Err(e) = clear_current_admin(session).await {
        tracing::warn!(error = %e, "Failed to clear expired session");
    }
    clear_sentry_user();
    flash::push(session, Toast::error(SESSION_EXPIRED)).await;
    Redirect::to("/auth/login").into_response()
}

/// Turn a failed mutation into a toast and a redirect to `back`.
pub async fn mutation_failed(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    error: &StoreError,
    fallback: &str,
    back: &str,
) -> Response {
    if error.is_unauthorized() {
        return expire_session(state, session, admin).await;
    }
    tracing::warn!(error = %error, "{fallback}");
    flash::push(session, Toast::error(error.user_message(fallback))).await;
    Redirect::to(back).into_response()
}

/// Outcome of loading data for a page.
pub enum Loaded<T> {
    Ready(T),
    /// The session expired; respond with this redirect.
    Expired(Response),
}

/// Load page data, turning a failure into an error toast and `fallback_value`.
pub async fn load_or_toast<T>(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    result: Result<T, StoreError>,
    fallback: &str,
    fallback_value: impl FnOnce() -> T,
) -> Loaded<T> {
    match result {
        Ok(value) => Loaded::Ready(value),
        Err(e) if e.is_unauthorized() => {
            Loaded::Expired(expire_session(state, session, admin).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "{fallback}");
            flash::push(session, Toast::error(e.user_message(fallback))).await;
            Loaded::Ready(fallback_value())
        }
    }
}

// =============================================================================
// Query strings
// =============================================================================

/// Link to `path` carrying the list query with `page` replaced.
#[must_use]
pub fn list_href(path: &str, query: &ListQuery, page: usize) -> String {
    let mut params = url::form_urlencoded::Serializer::new(String::new());
    let fields = [
        ("search", query.search.as_deref()),
        ("status", query.status.as_deref()),
        ("category", query.category.as_deref()),
        ("role", query.role.as_deref()),
        ("sort", query.sort.as_deref()),
        ("dir", query.dir.as_deref()),
    ];
    for (key, value) in fields {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            params.append_pair(key, value);
        }
    }
    if page > 1 {
        params.append_pair("page", &page.to_string());
    }
    let encoded = params.finish();
    if encoded.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{encoded}")
    }
}

/// A numbered page link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Pagination controls under a table.
#[derive(Debug, Clone)]
pub struct PageNav {
    pub prev: Option<String>,
    pub next: Option<String>,
    pub pages: Vec<PageLink>,
    pub first_index: usize,
    pub last_index: usize,
    pub total_items: usize,
}

impl PageNav {
    #[must_use]
    pub fn new<T>(path: &str, query: &ListQuery, page: &Page<T>) -> Self {
        Self {
            prev: page
                .has_prev()
                .then(|| list_href(path, query, page.prev_page())),
            next: page
                .has_next()
                .then(|| list_href(path, query, page.next_page())),
            pages: page
                .page_numbers()
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: list_href(path, query, number),
                    current: number == page.page,
                })
                .collect(),
            first_index: page.first_index(),
            last_index: page.last_index(),
            total_items: page.total_items,
        }
    }

    /// Whether there is more than one page to choose from.
    #[must_use]
    pub fn is_multi_page(&self) -> bool {
        self.pages.len() > 1
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/refresh", post(products::refresh))
        .route("/{id}", get(products::show).post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route(
            "/{id}/images",
            get(products::images_form).post(products::update_images),
        )
        .route(
            "/{id}/delete",
            get(products::delete_confirm).post(products::delete),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/new", get(orders::new_form))
        .route("/{id}/delivery", post(orders::set_delivery))
        .route("/{id}/payment", post(orders::set_payment))
        .route("/{id}/delete", post(orders::delete))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route("/edit", get(profile::edit_form))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}/delete", post(users::delete))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::products))
        .route("/orders", get(api::orders))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/profile", profile_routes())
        .nest("/users", user_routes())
        .nest("/api", api_routes())
}

#[cfg(test)]
mod tests {
    use storedesk_core::{AdminIdentity, UserId, UserRole};

    use super::*;

    #[test]
    fn test_list_href_keeps_filters_and_drops_empty_values() {
        let query = ListQuery {
            search: Some("shea butter".to_string()),
            status: Some(String::new()),
            category: Some("Face".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(
            list_href("/products", &query, 3),
            "/products?search=shea+butter&category=Face&page=3"
        );
        assert_eq!(list_href("/orders", &ListQuery::default(), 1), "/orders");
    }

    #[test]
    fn test_admin_user_view_initials() {
        let admin = CurrentAdmin::new(
            "t",
            AdminIdentity {
                id: UserId::new("u1"),
                name: "ada obi".to_string(),
                email: "ada@shop.ng".to_string(),
                role: UserRole::Admin,
            },
        );
        let view = AdminUserView::from(&admin);
        assert_eq!(view.initials, "AO");
        assert_eq!(view.email, "ada@shop.ng");
    }
}
