//! Cross-platform shutdown signal handling.

use tracing::{info, warn};

/// Completes when the process receives ctrl-c, or SIGTERM on unix.
pub async fn shutdown_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler; waiting for ctrl-c only");
                _ = tokio::signal::ctrl_c().await;
                info!("ctrl-c received");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("ctrl-c received"),
            _ = term.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    {
        _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received");
    }
}
