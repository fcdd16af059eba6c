//! Background idle-session eviction.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::pool::registry::SessionPool;
use crate::pool::session::SessionFactory;

/// Periodically runs [`SessionPool::evict_idle`] until shutdown.
pub struct PoolSweeper<F: SessionFactory> {
    pool: Arc<SessionPool<F>>,
    interval: Duration,
}

impl<F: SessionFactory> PoolSweeper<F> {
    pub fn new(pool: Arc<SessionPool<F>>, interval: Duration) -> Self {
        Self { pool, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Pool sweeper starting");

        let mut ticker = time::interval(self.interval);
        // first tick fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.pool.evict_idle();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Pool sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
