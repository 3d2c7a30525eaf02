//! Command implementations.
//!
//! Each command fetches from the store API through the dashboard's
//! [`ApiClient`] and writes plain lines (or JSON) to an [`Output`].

pub mod orders;
pub mod products;
pub mod session;
pub mod users;

use std::io::Write;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use storedesk_admin::api::{ApiClient, ApiError};
use storedesk_admin::config::{ApiConfig, parse_base_url};
use storedesk_core::CurrencyCode;
use thiserror::Error;

/// Errors a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Bad command-line value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store API refused or failed the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where command results go.
pub struct Output<W> {
    writer: W,
}

impl Output<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Output<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one line.
    pub fn line(&mut self, text: impl AsRef<str>) -> Result<(), CliError> {
        writeln!(self.writer, "{}", text.as_ref())?;
        Ok(())
    }

    /// Write a value as pretty-printed JSON.
    pub fn json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut self.writer, value)?;
        writeln!(self.writer)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Build an API client from the `--api-url` flag or `API_BASE_URL`.
pub fn api_client(api_url: Option<&str>) -> Result<ApiClient, CliError> {
    let raw = api_url.ok_or(CliError::MissingEnvVar("API_BASE_URL"))?;
    let base_url = parse_base_url(raw).map_err(CliError::InvalidArgument)?;
    let api = ApiClient::new(&ApiConfig {
        base_url,
        timeout: Duration::from_secs(30),
    })?;
    Ok(api)
}

/// An authenticated connection to the store API.
pub struct Context {
    pub api: ApiClient,
    token: SecretString,
    pub currency: CurrencyCode,
}

impl Context {
    /// Connect using `STOREDESK_TOKEN`, or sign in with
    /// `STOREDESK_EMAIL`/`STOREDESK_PASSWORD` when no token is set.
    pub async fn connect(api_url: Option<&str>) -> Result<Self, CliError> {
        let api = api_client(api_url)?;

        let token = match std::env::var("STOREDESK_TOKEN") {
            Ok(token) if !token.trim().is_empty() => SecretString::from(token),
            _ => {
                let credentials = session::credentials_from_env()?;
                let login = api.login(&credentials).await?;
                tracing::debug!(user = %login.user.email, "Signed in for this command");
                SecretString::from(login.token)
            }
        };

        let currency = std::env::var("CURRENCY")
            .ok()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default();

        Ok(Self {
            api,
            token,
            currency,
        })
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}
