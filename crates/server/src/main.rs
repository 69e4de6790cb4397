use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartocr_core::{
    load_config_or_default, validate_config, OcrOrchestrator, Recognizer, UnitLoader,
    CONFIG_PATH_ENV,
};
use smartocr_server::api::create_router;
use smartocr_server::clients::{HttpRecognizer, HttpUnitLoader};
use smartocr_server::shutdown::{close_on, shutdown_signal};
use smartocr_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
    } else {
        warn!(
            "Config file {:?} not found, using defaults and environment",
            config_path
        );
    }
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Devices: {:?}", config.devices.device_ids);
    info!(
        "Admission: max_concurrent={}, max_queue_wait={}ms, deadline={}ms",
        config.admission.max_concurrent,
        config.admission.max_queue_wait_ms,
        config.orchestrator.request_deadline_ms
    );

    // Create collaborators
    let recognizer_config = config
        .recognizer
        .as_ref()
        .context("No [recognizer] section configured")?;
    info!("Using recognizer service at {}", recognizer_config.url);
    let recognizer: Arc<dyn Recognizer> = Arc::new(HttpRecognizer::new(recognizer_config)?);
    let loader: Arc<dyn UnitLoader> = Arc::new(
        HttpUnitLoader::new(&config.loader).context("Failed to create unit loader")?,
    );

    // Create orchestrator
    let orchestrator = Arc::new(
        OcrOrchestrator::from_config(&config, loader, recognizer)
            .context("Failed to create orchestrator")?,
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown; admission closes before the drain
    axum::serve(listener, app)
        .with_graceful_shutdown(close_on(shutdown_signal(), Arc::clone(&orchestrator)))
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}
