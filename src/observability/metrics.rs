//! Metrics collection.
//!
//! Recorded through the `metrics` facade; whichever recorder the embedding
//! process installs receives them. With no recorder they are no-ops.
//!
//! # Metrics
//! - `relay_pool_sessions` (gauge): sessions by `state` (active, idle, total)
//! - `relay_signing_requests_total` (counter): by `chain`, `outcome`
//! - `relay_signing_polls` (histogram): status polls per signing request
//! - `relay_claims_total` (counter): claim workflow results by `outcome`
//! - `relay_pool_evictions_total` (counter): sessions removed by `reason`

use crate::blockchain::Chain;
use crate::pool::PoolMetrics;

pub fn record_pool(snapshot: &PoolMetrics) {
    metrics::gauge!("relay_pool_sessions", "state" => "active").set(snapshot.active as f64);
    metrics::gauge!("relay_pool_sessions", "state" => "idle").set(snapshot.idle as f64);
    metrics::gauge!("relay_pool_sessions", "state" => "total").set(snapshot.total as f64);
}

pub fn record_eviction(reason: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!("relay_pool_evictions_total", "reason" => reason).increment(count as u64);
    }
}

pub fn record_signing(chain: Chain, outcome: &'static str) {
    metrics::counter!(
        "relay_signing_requests_total",
        "chain" => chain.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_polls(chain: Chain, polls: u32) {
    metrics::histogram!("relay_signing_polls", "chain" => chain.as_str()).record(polls as f64);
}

pub fn record_claim(outcome: &'static str) {
    metrics::counter!("relay_claims_total", "outcome" => outcome).increment(1);
}
