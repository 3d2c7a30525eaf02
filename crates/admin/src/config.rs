//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_BASE_URL` - Base URL of the store REST API (e.g. `https://api.shop.ng/api`)
//! - `ADMIN_BASE_URL` - Public URL for the dashboard
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_TIMEOUT_SECS` - Request timeout for the store API (default: 30)
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `STORE_CACHE_TTL_SECS` - How long fetched collections stay cached, 1 to 604800 (default: 300)
//! - `ORDERS_PER_PAGE` - Orders table page size (default: 5)
//! - `PRODUCTS_PER_PAGE` - Products table page size (default: 10)
//! - `USERS_PER_PAGE` - Users table page size (default: 10)
//! - `LOW_STOCK_THRESHOLD` - Stock count at or below which a product is "low" (default: 5)
//! - `CURRENCY` - Display currency code (default: NGN)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use storedesk_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Longest accepted cache lifetime (one week).
const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Store REST API connection
    pub api: ApiConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the dashboard
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Lifetime of cached collections
    pub cache_ttl: Duration,
    /// Table page sizes
    pub pagination: PaginationConfig,
    /// Products at or below this stock count are flagged
    pub low_stock_threshold: i64,
    /// Currency used to display amounts
    pub currency: CurrencyCode,
    /// Log line format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Store REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub orders_per_page: usize,
    pub products_per_page: usize,
    pub users_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            orders_per_page: 5,
            products_per_page: 10,
            users_per_page: 10,
        }
    }
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

/// Source of configuration values, keyed by variable name.
trait Vars {
    fn get(&self, key: &str) -> Option<String>;

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

impl<F> Vars for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key).filter(|v| !v.trim().is_empty())
    }
}

impl TlsConfig {
    fn from_vars(vars: &impl Vars) -> Result<Option<Self>, ConfigError> {
        let cert_pem = vars.get("ADMIN_TLS_CERT");
        let key_pem = vars.get("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ApiConfig {
    fn from_vars(vars: &impl Vars) -> Result<Self, ConfigError> {
        let raw = vars.required("API_BASE_URL")?;
        let base_url = parse_base_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e))?;
        let timeout_secs: u64 = vars.parsed_or("API_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "API_TIMEOUT_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse an API base URL, normalizing it to end with `/` so that
/// `Url::join` appends instead of replacing the last path segment.
///
/// # Errors
///
/// Returns a description when the URL is malformed or not http(s).
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl PaginationConfig {
    fn from_vars(vars: &impl Vars) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            orders_per_page: vars.parsed_or("ORDERS_PER_PAGE", defaults.orders_per_page)?,
            products_per_page: vars.parsed_or("PRODUCTS_PER_PAGE", defaults.products_per_page)?,
            users_per_page: vars.parsed_or("USERS_PER_PAGE", defaults.users_per_page)?,
        };
        for (key, value) in [
            ("ORDERS_PER_PAGE", config.orders_per_page),
            ("PRODUCTS_PER_PAGE", config.products_per_page),
            ("USERS_PER_PAGE", config.users_per_page),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must be greater than 0".to_string(),
                ));
            }
        }
        Ok(config)
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_vars(&lookup)
    }

    fn from_vars(vars: &impl Vars) -> Result<Self, ConfigError> {
        let api = ApiConfig::from_vars(vars)?;
        let host: IpAddr = vars.parsed_or("ADMIN_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = vars.parsed_or("ADMIN_PORT", 3001)?;
        let base_url = vars.required("ADMIN_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;

        let session_secret = vars.required("ADMIN_SESSION_SECRET")?;
        validate_secret_strength(&session_secret, "ADMIN_SESSION_SECRET")?;
        let session_secret = SecretString::from(session_secret);
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;

        let cache_ttl_secs: u64 = vars.parsed_or("STORE_CACHE_TTL_SECS", 300)?;
        if !(1..=MAX_CACHE_TTL_SECS).contains(&cache_ttl_secs) {
            return Err(ConfigError::InvalidEnvVar(
                "STORE_CACHE_TTL_SECS".to_string(),
                format!("must be between 1 and {MAX_CACHE_TTL_SECS}"),
            ));
        }
        let cache_ttl = Duration::from_secs(cache_ttl_secs);
        let pagination = PaginationConfig::from_vars(vars)?;
        let low_stock_threshold = vars.parsed_or("LOW_STOCK_THRESHOLD", 5)?;
        let currency = vars.parsed_or("CURRENCY", CurrencyCode::NGN)?;

        let log_format = vars.parsed_or("LOG_FORMAT", LogFormat::default())?;

        let sentry_dsn = vars.get("SENTRY_DSN");
        let sentry_environment = vars.get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = vars
            .get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = vars
            .get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_vars(vars)?;

        Ok(Self {
            api,
            host,
            port,
            base_url,
            session_secret,
            cache_ttl,
            pagination,
            low_stock_threshold,
            currency,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("API_BASE_URL", "https://api.shop.ng/api"),
            ("ADMIN_BASE_URL", "https://admin.shop.ng"),
            ("ADMIN_SESSION_SECRET", STRONG_SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.api.base_url.as_str(), "https://api.shop.ng/api/");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.pagination, PaginationConfig::default());
        assert_eq!(config.pagination.orders_per_page, 5);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.currency, CurrencyCode::NGN);
        assert!(config.tls.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("ADMIN_PORT", "8080"),
            ("ORDERS_PER_PAGE", "20"),
            ("CURRENCY", "usd"),
            ("API_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = AdminConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.pagination.orders_per_page, 20);
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.api.timeout, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_api_base_url() {
        let vars: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "API_BASE_URL")
            .collect();
        let err = AdminConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "API_BASE_URL"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut vars = minimal();
        vars.push(("ADMIN_PORT", "not-a-port"));
        assert!(matches!(
            AdminConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidEnvVar(..))
        ));

        let mut vars = minimal();
        vars.push(("PRODUCTS_PER_PAGE", "0"));
        assert!(AdminConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = minimal();
        vars.push(("ADMIN_TLS_CERT", "-----BEGIN CERTIFICATE-----"));
        assert!(AdminConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_cache_ttl_bounds() {
        for ttl in ["0", "604801", "18446744073709551615"] {
            let mut vars = minimal();
            vars.push(("STORE_CACHE_TTL_SECS", ttl));
            assert!(
                matches!(
                    AdminConfig::from_lookup(lookup(&vars)),
                    Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "STORE_CACHE_TTL_SECS"
                ),
                "{ttl}"
            );
        }

        let mut vars = minimal();
        vars.push(("STORE_CACHE_TTL_SECS", "604800"));
        let config = AdminConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(604_800));
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("http://localhost:5000").unwrap().as_str(),
            "http://localhost:5000/"
        );
        assert_eq!(
            parse_base_url("https://api.shop.ng/v1/").unwrap().as_str(),
            "https://api.shop.ng/v1/"
        );
        assert!(parse_base_url("ftp://files.shop.ng").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG_SECRET) > 3.3);
    }

    #[test]
    fn test_session_secret_checks() {
        let mut vars = minimal();
        vars.retain(|(k, _)| *k != "ADMIN_SESSION_SECRET");

        let mut placeholder = vars.clone();
        placeholder.push(("ADMIN_SESSION_SECRET", "changeme-changeme-changeme-changeme"));
        assert!(matches!(
            AdminConfig::from_lookup(lookup(&placeholder)),
            Err(ConfigError::InsecureSecret(..))
        ));

        let mut low_entropy = vars.clone();
        low_entropy.push(("ADMIN_SESSION_SECRET", "abababababababababababababababab"));
        assert!(AdminConfig::from_lookup(lookup(&low_entropy)).is_err());

        let mut short = vars;
        short.push(("ADMIN_SESSION_SECRET", "aB3$xY9!mK2@"));
        assert!(matches!(
            AdminConfig::from_lookup(lookup(&short)),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AdminConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains(STRONG_SECRET));

        let tls = TlsConfig {
            cert_pem: "cert".to_string(),
            key_pem: SecretString::from("super_private_key"),
        };
        let debug_output = format!("{tls:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_key"));
    }
}
