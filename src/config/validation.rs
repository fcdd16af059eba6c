//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, sizes > 0, percentages ≤ 100)
//! - Check that base URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `pool.max_size`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collect every semantic error in `config`.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: &str| {
        errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        })
    };

    for (field, value) in [
        ("signer.base_url", &config.signer.base_url),
        ("indexer.base_url", &config.indexer.base_url),
        ("claims.base_url", &config.claims.base_url),
    ] {
        if url::Url::parse(value).is_err() {
            fail(field, "must be an absolute URL");
        }
    }

    for (field, value) in [
        ("signer.request_timeout_secs", config.signer.request_timeout_secs),
        ("signer.poll_interval_ms", config.signer.poll_interval_ms),
        ("signer.sign_timeout_secs", config.signer.sign_timeout_secs),
        ("indexer.request_timeout_secs", config.indexer.request_timeout_secs),
        ("claims.request_timeout_secs", config.claims.request_timeout_secs),
        ("claims.submit_timeout_secs", config.claims.submit_timeout_secs),
        ("pool.idle_timeout_secs", config.pool.idle_timeout_secs),
        ("pool.sweep_interval_secs", config.pool.sweep_interval_secs),
    ] {
        if value == 0 {
            fail(field, "must be greater than zero");
        }
    }

    if config.pool.max_size == 0 {
        fail("pool.max_size", "must be greater than zero");
    }
    if config.indexer.page_size == 0 || config.indexer.page_size > 100 {
        fail("indexer.page_size", "must be between 1 and 100");
    }
    if config.claims.batch_size == 0 {
        fail("claims.batch_size", "must be greater than zero");
    }
    if config.claims.clear_threshold_percent > 100 {
        fail("claims.clear_threshold_percent", "must be at most 100");
    }
    if config.claims.max_attempts == 0 {
        fail("claims.max_attempts", "must be at least 1");
    }
    if config.transfer.fee == 0 {
        fail("transfer.fee", "must be greater than zero");
    }
    if config.transfer.ttl_buffer == 0 {
        fail("transfer.ttl_buffer", "must be greater than zero");
    }
    if tracing_subscriber::EnvFilter::try_new(&config.observability.log_level).is_err() {
        fail("observability.log_level", "is not a valid filter directive");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
