mod metrics;
mod status;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use petcam_core::{
    load_config, validate_config, Capturer, CommandCapturer, Notifier, PollingOrchestrator,
    SanitizedConfig, SlackNotifier, SqsWorkSource, WorkSource,
};

use status::{create_router, StatusState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file picked up from the working directory when `PETCAM_CONFIG` is unset
const DEFAULT_CONFIG_FILE: &str = "petcam.toml";

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(false))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PETCAM_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

async fn run() -> Result<()> {
    info!(version = VERSION, "Starting petcam");

    let config_path = config_path();
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file found, using environment only"),
    }

    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        queue = %sanitized.queue.url,
        channel = %sanitized.slack.channel_id,
        clip_secs = sanitized.orchestrator.clip_duration_secs,
        max_failures = sanitized.orchestrator.retry.max_consecutive_failures,
        cooldown_secs = sanitized.orchestrator.retry.cooldown_secs,
        "Configuration loaded"
    );

    let source: Arc<dyn WorkSource> =
        Arc::new(SqsWorkSource::from_config(config.queue.clone()).await);
    info!("Using work source: {}", source.name());

    let capturer = CommandCapturer::new(config.capture.clone());
    capturer
        .validate()
        .await
        .context("Capture tools are not available")?;
    let capturer: Arc<dyn Capturer> = Arc::new(capturer);
    info!("Using capturer: {}", capturer.name());

    let output_dir = &config.orchestrator.output_dir;
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let notifier: Arc<dyn Notifier> = Arc::new(
        SlackNotifier::new(config.slack.clone()).context("Failed to create Slack notifier")?,
    );
    info!("Using notifier: {}", notifier.name());

    let mut orchestrator = PollingOrchestrator::new(
        config.orchestrator.clone(),
        config.notices.clone(),
        source,
        capturer,
        notifier,
    );

    let status_server = if config.status.enabled {
        let state = Arc::new(StatusState::new(sanitized, orchestrator.status_handle()));
        let addr = SocketAddr::new(config.status.host, config.status.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        info!("Status server listening on {}", addr);

        let app = create_router(state);
        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Status server stopped: {}", e);
            }
        }))
    } else {
        None
    };

    let handle = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown requested, finishing current step");
        handle.shutdown();
    });

    let result = orchestrator.run().await;

    if let Some(server) = status_server {
        server.abort();
    }

    result.context("Orchestrator stopped")?;
    info!("petcam stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
