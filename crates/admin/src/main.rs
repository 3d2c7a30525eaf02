//! Storedesk Admin - store management dashboard.
//!
//! Serves the dashboard (port 3001 by default) over the store REST API
//! configured by `API_BASE_URL`. See [`storedesk_admin::config`] for every
//! setting.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use storedesk_admin::config::{AdminConfig, LogFormat, TlsConfig};
use storedesk_admin::state::AppState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// In-flight requests get this long to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Into::into),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            // Customer names and addresses pass through request data
            send_default_pii: false,
            ..Default::default()
        },
    ));
    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug ride along as
/// breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storedesk_admin=info,tower_http=debug".into());

    let (json, text) = match format {
        LogFormat::Json => (
            Some(tracing_subscriber::fmt::layer().json().flatten_event(true)),
            None,
        ),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AdminConfig::from_env().expect("Failed to load configuration");

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    tracing::info!(
        api = %config.api.base_url,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        currency = config.currency.code(),
        "Starting storedesk admin"
    );

    let state = AppState::new(config.clone()).expect("Failed to create application state");
    let app = storedesk_admin::app(state);
    let addr = config.socket_addr();

    match &config.tls {
        Some(tls) => serve_tls(app, addr, tls).await,
        None => serve_plain(app, addr).await,
    }
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &TlsConfig) {
    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
        }
    });

    tracing::info!("admin listening on https://{addr}");
    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}

async fn serve_plain(app: Router, addr: SocketAddr) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("admin listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
