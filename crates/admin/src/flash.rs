//! Toast notifications carried across a redirect.
//!
//! Handlers push a toast after an action; the next rendered page drains the
//! queue and shows each toast once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Toast severity. Templates use `as_str` as a CSS modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

impl ToastLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
}

/// Queue a toast for the next rendered page.
///
/// Session failures are logged and the toast is dropped; a missing toast
/// never fails the request.
pub async fn push(session: &Session, toast: Toast) {
    let mut queue: Vec<Toast> = session
        .get(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    queue.push(toast);
    if let Err(e) = session.insert(session_keys::TOASTS, queue).await {
        tracing::warn!(error = %e, "Failed to queue toast");
    }
}

/// Take every queued toast, leaving the queue empty.
pub async fn drain(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(session_keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read toasts");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_drain_returns_toasts_in_order_once() {
        let session = session();
        push(&session, Toast::success("Product created successfully")).await;
        push(&session, Toast::error("Failed to delete order")).await;

        let toasts = drain(&session).await;
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts.first().unwrap().level, ToastLevel::Success);
        assert_eq!(toasts.last().unwrap().message, "Failed to delete order");

        assert!(drain(&session).await.is_empty());
    }

    #[test]
    fn test_level_css_names() {
        assert_eq!(Toast::info("x").level.as_str(), "info");
        assert_eq!(ToastLevel::Error.as_str(), "error");
    }
}
