// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::watch;

use crate::logger;

/// Shutdown flag shared by the signal task, the accept loop and every
/// connection task
pub struct SignalHandler {
    shutdown: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown }
    }

    /// Flip the flag. Waiters that subscribe afterwards still observe it.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once shutdown has been requested, or the handler is gone.
pub async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        let requested = *rx.borrow_and_update();
        if requested || rx.changed().await.is_err() {
            return;
        }
    }
}

/// Start signal handlers (Unix: SIGTERM and SIGINT)
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("{name} received, shutting down"));
        handler.request_shutdown();
    });
    Ok(())
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("Ctrl+C received, shutting down");
            handler.request_shutdown();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_request_before_wait_is_not_lost() {
        let handler = SignalHandler::new();
        handler.request_shutdown();

        let mut rx = handler.subscribe();
        tokio::time::timeout(Duration::from_secs(1), shutdown_requested(&mut rx))
            .await
            .expect("earlier request should be observed");
    }

    #[tokio::test]
    async fn test_every_subscriber_is_woken() {
        let handler = Arc::new(SignalHandler::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let mut rx = handler.subscribe();
                tokio::spawn(async move { shutdown_requested(&mut rx).await })
            })
            .collect();

        handler.request_shutdown();
        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("subscriber should wake")
                .unwrap();
        }
    }
}
