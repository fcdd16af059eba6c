//! Bounded session pool.
//!
//! # Responsibilities
//! - Hand out one session per (account, chain), building it on first use
//! - Cap the number of live sessions, reclaiming the least recently used
//!   idle session when full
//! - Evict sessions that stay idle past the timeout
//!
//! # Concurrency
//! The map lives behind a `std::sync::Mutex` and the lock is never held
//! across an await. A slot is reserved under the lock before the factory
//! runs, so concurrent misses cannot push the pool past `max_size`.
//! Two callers acquiring the same key share one session; nothing here
//! serializes their use of it.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::blockchain::Chain;
use crate::config::PoolConfig;
use crate::error::{RelayError, RelayResult};
use crate::observability::metrics;
use crate::pool::session::{SessionFactory, SessionKey};

/// Point-in-time pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetrics {
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub max_size: usize,
}

impl PoolMetrics {
    /// Occupancy as a percentage of `max_size`.
    pub fn usage_percent(&self) -> f64 {
        if self.max_size == 0 {
            return 100.0;
        }
        self.total as f64 * 100.0 / self.max_size as f64
    }
}

struct Entry<S> {
    session: Arc<S>,
    active: bool,
    last_used: Instant,
}

struct Inner<S> {
    sessions: HashMap<SessionKey, Entry<S>>,
    /// Slots held by constructions in flight.
    reserved: usize,
}

impl<S> Inner<S> {
    fn snapshot(&self, max_size: usize) -> PoolMetrics {
        let active = self.sessions.values().filter(|e| e.active).count();
        PoolMetrics {
            total: self.sessions.len(),
            active,
            idle: self.sessions.len() - active,
            max_size,
        }
    }

    fn least_recently_used_idle(&self) -> Option<SessionKey> {
        self.sessions
            .iter()
            .filter(|(_, e)| !e.active)
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone())
    }
}

/// Frees a reserved slot when dropped, including when the acquiring future
/// is cancelled mid-construction.
struct Reservation<'a, S> {
    inner: &'a Mutex<Inner<S>>,
}

impl<S> Drop for Reservation<'_, S> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.reserved = inner.reserved.saturating_sub(1);
    }
}

/// Bounded cache of sessions keyed by (account, chain).
pub struct SessionPool<F: SessionFactory> {
    factory: F,
    inner: Mutex<Inner<F::Session>>,
    max_size: usize,
    idle_timeout: Duration,
}

impl<F: SessionFactory> SessionPool<F> {
    pub fn new(factory: F, config: &PoolConfig) -> Self {
        Self::with_limits(factory, config.max_size, config.idle_timeout())
    }

    pub fn with_limits(factory: F, max_size: usize, idle_timeout: Duration) -> Self {
        Self {
            factory,
            inner: Mutex::new(Inner { sessions: HashMap::new(), reserved: 0 }),
            max_size,
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<F::Session>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Session for `(account, chain)`, building one if needed.
    pub async fn acquire(&self, account: &str, chain: Chain) -> RelayResult<Arc<F::Session>> {
        let key = SessionKey::new(account, chain);

        let reservation = {
            let mut inner = self.lock();
            if let Some(entry) = inner.sessions.get_mut(&key) {
                entry.active = true;
                entry.last_used = Instant::now();
                let session = entry.session.clone();
                metrics::record_pool(&inner.snapshot(self.max_size));
                tracing::debug!(session = %key, "Reusing pooled session");
                return Ok(session);
            }

            if inner.sessions.len() + inner.reserved >= self.max_size {
                match inner.least_recently_used_idle() {
                    Some(victim) => {
                        inner.sessions.remove(&victim);
                        metrics::record_eviction("reclaimed", 1);
                        tracing::info!(evicted = %victim, session = %key, "Reclaimed idle session");
                    }
                    None => {
                        tracing::warn!(session = %key, max_size = self.max_size, "Session pool exhausted");
                        return Err(RelayError::PoolExhausted { max_size: self.max_size });
                    }
                }
            }

            inner.reserved += 1;
            Reservation { inner: &self.inner }
        };

        let session = Arc::new(self.factory.create(&key).await?);

        let mut inner = self.lock();
        let session = match inner.sessions.get_mut(&key) {
            // a concurrent acquire built the same key first
            Some(entry) => {
                entry.active = true;
                entry.last_used = Instant::now();
                entry.session.clone()
            }
            None => {
                inner.sessions.insert(
                    key.clone(),
                    Entry { session: session.clone(), active: true, last_used: Instant::now() },
                );
                session
            }
        };
        metrics::record_pool(&inner.snapshot(self.max_size));
        drop(inner);
        drop(reservation);

        tracing::debug!(session = %key, "Session added to pool");
        Ok(session)
    }

    /// Mark every session of `account` idle. Returns how many were released.
    pub fn release(&self, account: &str) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let mut released = 0;
        for (key, entry) in inner.sessions.iter_mut() {
            if key.account == account {
                entry.active = false;
                entry.last_used = now;
                released += 1;
            }
        }
        metrics::record_pool(&inner.snapshot(self.max_size));
        released
    }

    /// Remove idle sessions unused for longer than the idle timeout.
    pub fn evict_idle(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let timeout = self.idle_timeout;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, e| e.active || now.duration_since(e.last_used) <= timeout);
        let evicted = before - inner.sessions.len();

        metrics::record_eviction("idle_timeout", evicted);
        metrics::record_pool(&inner.snapshot(self.max_size));
        if evicted > 0 {
            tracing::info!(evicted, remaining = inner.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Remove every idle session regardless of age.
    pub fn clear_idle(&self) -> usize {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, e| e.active);
        let cleared = before - inner.sessions.len();

        metrics::record_eviction("cleared", cleared);
        metrics::record_pool(&inner.snapshot(self.max_size));
        tracing::info!(cleared, remaining = inner.sessions.len(), "Cleared idle sessions");
        cleared
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.lock().snapshot(self.max_size)
    }

    /// Drop every session. Handles already given out stay usable.
    pub fn shutdown(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.sessions.len();
        inner.sessions.clear();
        metrics::record_pool(&inner.snapshot(self.max_size));
        tracing::info!(dropped, "Session pool shut down");
        dropped
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
