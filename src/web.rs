use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Slack on top of the per-side lookup budget before a request is cut off
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// How long open HTTPS connections get to finish after ctrl-c
#[cfg(feature = "tls")]
const TLS_DRAIN_PERIOD: Duration = Duration::from_secs(10);

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api::router(state));

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        config.lookup_timeout() + REQUEST_TIMEOUT_MARGIN,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
}

pub async fn run(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = build_router(state, config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (&config.tls_cert, &config.tls_key) {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
            .await
            .context("Failed to load TLS certificate or key")?;
        let handle = drain_on(shutdown_signal());
        tracing::info!("Web server running at https://{}", addr);
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTPS server failed")?;
        return Ok(());
    }

    #[cfg(not(feature = "tls"))]
    if config.tls_cert.is_some() {
        tracing::warn!("TLS certificate configured but built without the `tls` feature; serving plain HTTP");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// Handle that starts a graceful shutdown once `signal` resolves
#[cfg(feature = "tls")]
fn drain_on<F>(signal: F) -> axum_server::Handle
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let handle = axum_server::Handle::new();
    let watcher = handle.clone();
    tokio::spawn(async move {
        signal.await;
        watcher.graceful_shutdown(Some(TLS_DRAIN_PERIOD));
    });
    handle
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
