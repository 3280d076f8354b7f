use super::Quitter;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawns a task that quits the session on SIGINT or SIGTERM
///
/// The task ends on its own once the quitter is quit for any other reason.
pub fn spawn_signal_watcher(quitter: Quitter) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => {
                if quitter.quit() {
                    info!("Shutting down");
                }
            }
            _ = quitter.wait() => {}
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to install signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            info!("Interrupt received");
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received"),
        _ = sigterm.recv() => info!("SIGTERM received"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Interrupt received");
    }
}
