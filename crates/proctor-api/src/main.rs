//! Proctoring API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use proctor_api::{create_router, metrics, ApiConfig, AppState};
use proctor_vision::{ModelConfig, OnnxProviders, ThresholdConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("proctor=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting proctor-api");

    let config = ApiConfig::from_env();
    let thresholds = ThresholdConfig::from_env();
    let models = ModelConfig::from_env();
    info!(
        host = %config.host,
        port = config.port,
        capture_dir = %config.capture_dir.display(),
        max_violations = config.max_violations,
        "API config loaded"
    );

    // Detection models are loaded once and shared by every request.
    let providers = tokio::task::spawn_blocking(move || OnnxProviders::load(&models))
        .await
        .context("model loading task failed")?
        .context("failed to load detection models")?;

    tokio::fs::create_dir_all(&config.capture_dir)
        .await
        .with_context(|| format!("failed to create {}", config.capture_dir.display()))?;

    let state = AppState::new(config.clone(), providers.landmarks, providers.objects, thresholds);

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install Prometheus recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
