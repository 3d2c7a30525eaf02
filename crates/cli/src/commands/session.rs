//! Sign-in.

use std::io::Write;

use storedesk_admin::api::ApiClient;
use storedesk_core::validation::{Credentials, FieldErrors, LoginForm};

use super::{CliError, Output};

/// Read admin credentials from `STOREDESK_EMAIL` and `STOREDESK_PASSWORD`.
pub fn credentials_from_env() -> Result<Credentials, CliError> {
    let email =
        std::env::var("STOREDESK_EMAIL").map_err(|_| CliError::MissingEnvVar("STOREDESK_EMAIL"))?;
    let password = std::env::var("STOREDESK_PASSWORD")
        .map_err(|_| CliError::MissingEnvVar("STOREDESK_PASSWORD"))?;
    credentials(email, password)
}

fn credentials(email: String, password: String) -> Result<Credentials, CliError> {
    LoginForm { email, password }
        .validate()
        .map_err(|errors| CliError::InvalidArgument(describe(&errors)))
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sign in and print the bearer token for `STOREDESK_TOKEN`.
pub async fn login<W: Write>(api: &ApiClient, out: &mut Output<W>) -> Result<(), CliError> {
    let credentials = credentials_from_env()?;
    let session = api.login(&credentials).await?;
    tracing::info!(user = %session.user.display_name(), "Signed in");
    out.line(session.token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_reports_every_field() {
        let err = credentials("not-an-email".to_string(), String::new()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("email:"), "{text}");
        assert!(text.contains("password: Password is required"), "{text}");
    }

    #[test]
    fn test_credentials_accepts_valid_login() {
        let creds = credentials("admin@shop.ng".to_string(), "secret".to_string()).unwrap();
        assert_eq!(creds.email.as_str(), "admin@shop.ng");
    }
}
