//! Retry support for callers of the core.
//!
//! The core itself never retries; the batch runner wraps transient claim API
//! and signer failures with [`backoff::retry_transient`].

pub mod backoff;

pub use backoff::{calculate_backoff, retry_transient};
