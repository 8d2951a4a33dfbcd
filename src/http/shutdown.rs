//! Graceful shutdown and signal handling.
//!
//! One signal stops both halves of the process: the poller finishes its
//! current cycle and exits, and the server drains in-flight requests.

use std::time::Duration;

use axum_server::Handle;
use tokio::sync::watch;

use crate::config::SHUTDOWN_GRACE_SECS;

/// Resolves with the name of the first termination signal received.
///
/// A handler that cannot be installed is logged and never fires, so the
/// other one still works.
async fn termination_signal() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGINT");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// Stop the poller and drain the server on SIGTERM or SIGINT.
pub fn setup_shutdown_handler(handle: Handle, stop: watch::Sender<bool>) {
    tokio::spawn(async move {
        let signal = termination_signal().await;
        tracing::info!(signal, grace_secs = SHUTDOWN_GRACE_SECS, "Shutting down");

        stop.send_replace(true);
        handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
    });
}
