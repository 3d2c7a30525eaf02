//! JSON API route handlers for admin.
//!
//! Read-only views of the session's cached collections. Unauthenticated
//! requests get 401 from the extractor instead of a login redirect.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Cached product list.
///
/// GET /api/products
///
/// # Errors
///
/// Returns the mapped store failure; a rejected token is a 401.
#[instrument(skip_all)]
pub async fn products(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let products = state.stores().products.all(&admin.token).await?;
    Ok(Json(products.as_slice()).into_response())
}

/// Cached order list.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns the mapped store failure; a rejected token is a 401.
#[instrument(skip_all)]
pub async fn orders(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let orders = state.stores().orders.all(&admin.token).await?;
    Ok(Json(orders.as_slice()).into_response())
}
