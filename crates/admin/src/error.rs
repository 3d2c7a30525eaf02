//! Error responses for the JSON endpoints, plus Sentry user scoping.
//!
//! HTML handlers never return these; they turn failures into toasts.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::api::ApiError;
use crate::stores::StoreError;

/// Failure of a JSON endpoint.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::Api(ApiError::Unauthorized(_))) => StatusCode::UNAUTHORIZED,
            Self::Store(StoreError::Api(ApiError::NotFound(_)) | StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Store(StoreError::Api(ApiError::RateLimited(_))) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Store(StoreError::Api(_)) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::Busy) => StatusCode::CONFLICT,
            Self::Store(StoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::Api(e)) => e.user_message("Store API error"),
            Self::Store(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "JSON endpoint failed"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Tag Sentry events with the signed-in admin.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storedesk_core::validation::FieldErrors;

    use super::*;

    fn status_of(err: StoreError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_store_failures_map_to_statuses() {
        assert_eq!(
            status_of(StoreError::Api(ApiError::Unauthorized(None))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(StoreError::NotFound("Product".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::Api(ApiError::RateLimited(30))),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_of(StoreError::Busy), StatusCode::CONFLICT);
        assert_eq!(
            status_of(StoreError::Validation(FieldErrors::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(StoreError::Api(ApiError::Api {
                status: 500,
                message: None
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_public_message_prefers_api_text() {
        let err = AppError::from(StoreError::Api(ApiError::Api {
            status: 500,
            message: Some("db down".to_string()),
        }));
        assert_eq!(err.public_message(), "db down");

        let err = AppError::from(StoreError::Api(ApiError::Parse("bad json".to_string())));
        assert_eq!(err.public_message(), "Store API error");
    }
}
