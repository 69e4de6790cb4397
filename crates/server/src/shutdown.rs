//! Shutdown signal handling.

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use smartocr_core::OcrOrchestrator;

/// Resolves once `signal` fires, after closing the orchestrator.
///
/// Used as the graceful-shutdown future so admission closes before the HTTP
/// drain starts: requests still waiting for a permit fail right away instead
/// of holding the drain open.
pub async fn close_on<F>(signal: F, orchestrator: Arc<OcrOrchestrator>)
where
    F: Future<Output = ()>,
{
    signal.await;
    info!("Shutdown signal received, closing admission");
    orchestrator.shutdown();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
