//! Termination signals turn into a force quit on the event loop.

use tokio::runtime::Handle;

use super::types::{AppEvent, AppEventSender};

/// Listen for Ctrl+C (and SIGTERM on Unix) for the life of the runtime.
pub fn spawn_signal_listener(runtime: &Handle, sender: AppEventSender) {
    runtime.spawn(async move {
        wait_for_termination().await;
        tracing::info!("Termination signal received");
        if !sender.send(AppEvent::ForceQuit) {
            tracing::debug!("Event loop already gone");
        }
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {e}");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
