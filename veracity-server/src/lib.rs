//! HTTP surface for Veracity: the evaluation endpoint, a liveness probe and
//! the bundled single-page frontend.

pub mod routes;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use veracity_eval::Evaluator;

pub use routes::{ApiError, EvaluateRequest, router};

/// Serve `evaluator` on `listener` until `cancel` fires, then drain in-flight
/// requests and return.
pub async fn serve(listener: TcpListener, evaluator: Evaluator, cancel: CancellationToken) -> Result<()> {
    let app: Router = router(evaluator);
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "veracity listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Cancel `cancel` on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl-c received; shutting down"),
        _ = terminate => tracing::info!("SIGTERM received; shutting down"),
        _ = cancel.cancelled() => return,
    }
    cancel.cancel();
}
