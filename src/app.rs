/*
 * Responsibility
 * - tracing / panic hook setup
 * - Config → verifier → AppState → Router
 * - Router-wide middleware (http / cors / security headers)
 * - Serve over TLS when the cert/key files exist, plaintext (with a warning) otherwise
 * - Graceful shutdown on Ctrl-C / SIGTERM
 */
use std::{panic, path::Path, process, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::{Config, KeySourceConfig, TlsConfig},
    middleware,
    services::auth::build_verifier,
    state::AppState,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn init_tracing() {
    // RUST_LOG wins, ex: RUST_LOG=info,bearer_gate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // dev: crash loudly. prod: default hook, server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;
    init_panic_hook(!config.app_env.is_production());

    let verifier = build_verifier(&config.auth)?;
    log_startup(&config, &verifier.key_source().describe());

    let state = AppState::new(verifier, config.auth.strategy.clone());
    let tls = usable_tls(config.tls.as_ref());
    let app = build_router(state, &config, tls.is_some());

    match tls {
        Some(tls) => serve_tls(app, &config, tls).await,
        None => serve_plain(app, &config).await,
    }
}

fn log_startup(config: &Config, key_source: &str) {
    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        provider = config.auth.provider.name(),
        issuer = %config.auth.issuer,
        audience = %config.auth.audience,
        strategy = config.auth.strategy.name(),
        keys = %key_source,
        "starting bearer-gate"
    );
    if let KeySourceConfig::File(path) = &config.auth.keys {
        tracing::warn!(path = %path.display(), "using a static JWKS file, keys will not rotate");
    }
    tracing::info!(
        "routes: GET /health (public), GET|POST /api/resources, PUT /api/resources/{{id}}, \
         GET|PUT /api/profile, GET /api/token-info"
    );
}

/// TLS material to serve with, if both files are on disk.
fn usable_tls(tls: Option<&TlsConfig>) -> Option<&TlsConfig> {
    let Some(tls) = tls else {
        tracing::warn!("TLS_CERT_PATH / TLS_KEY_PATH not set, serving plaintext HTTP");
        return None;
    };

    let missing: Vec<&Path> = [tls.cert_path.as_path(), tls.key_path.as_path()]
        .into_iter()
        .filter(|p| !p.is_file())
        .collect();

    if missing.is_empty() {
        Some(tls)
    } else {
        tracing::warn!(?missing, "TLS files not found, serving plaintext HTTP");
        None
    }
}

pub fn build_router(state: AppState, config: &Config, tls: bool) -> Router {
    let app = api::routes(&state).with_state(state);

    let app = middleware::http::apply(app, config);
    let app = middleware::cors::apply(app, config);
    middleware::security_headers::apply(app, tls)
}

async fn serve_plain(app: Router, config: &Config) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening (http)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn serve_tls(app: Router, config: &Config, tls: &TlsConfig) -> Result<()> {
    // Both ring and aws-lc-rs may be compiled in; pin the process-wide provider.
    // Err means one is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS cert {} / key {}",
                tls.cert_path.display(),
                tls.key_path.display()
            )
        })?;

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    tracing::info!(addr = %config.addr, "listening (https)");
    axum_server::bind_rustls(config.addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
