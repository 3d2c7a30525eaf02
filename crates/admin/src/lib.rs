//! Storedesk Admin library.
//!
//! The dashboard as a library, so the binary and the integration tests
//! build the same router.
//!
//! # Security
//!
//! Every page except login acts with the signed-in admin's bearer token
//! for the store API. Tokens live only in the server-side session and are
//! never rendered.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod stores;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{create_session_layer, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router with every layer applied.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        admin_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store API cannot be reached.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.api().ping().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Store API unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    fn test_app() -> Router {
        let config = AdminConfig::from_lookup(|key| {
            match key {
                "API_BASE_URL" => Some("http://127.0.0.1:9/api"),
                "ADMIN_BASE_URL" => Some("http://localhost:3001"),
                "ADMIN_SESSION_SECRET" => Some("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
                _ => None,
            }
            .map(String::from)
        })
        .unwrap();
        app(AppState::new(config).unwrap())
    }

    async fn get(path: &str) -> axum::response::Response {
        test_app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let response = get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );
    }

    #[tokio::test]
    async fn test_pages_redirect_to_login_without_session() {
        for path in ["/", "/products", "/orders/new", "/profile", "/users"] {
            let response = get(path).await;
            assert!(response.status().is_redirection(), "{path}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/auth/login",
                "{path}"
            );
        }
    }

    #[tokio::test]
    async fn test_json_api_rejects_without_session() {
        let response = get("/api/products").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = get("/auth/login").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
