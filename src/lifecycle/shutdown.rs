//! Shutdown fan-out for the sweeper and any other background task.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// One-shot shutdown broadcast. Triggering twice is harmless.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            let listeners = self.tx.send(()).unwrap_or(0);
            tracing::info!(listeners, "Shutdown triggered");
        }
    }

    /// Resolve on Ctrl-C, then trigger. If the handler cannot be installed
    /// this never resolves and shutdown stays manual.
    pub async fn trigger_on_ctrl_c(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
        tracing::warn!("Interrupted");
        self.trigger();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
