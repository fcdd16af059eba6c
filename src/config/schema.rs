//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Secrets are
//! never read from the file; see [`SignerConfig::api_key`] and friends.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the custody API key.
pub const SIGNER_API_KEY_ENV: &str = "RELAY_SIGNER_API_KEY";
/// Environment variable holding the custody bearer token.
pub const SIGNER_TOKEN_ENV: &str = "RELAY_SIGNER_TOKEN";
/// Environment variable holding the indexer project id.
pub const INDEXER_PROJECT_ID_ENV: &str = "RELAY_INDEXER_PROJECT_ID";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Remote custody signer.
    pub signer: SignerConfig,

    /// UTXO indexer used for transfers.
    pub indexer: IndexerConfig,

    /// Claim eligibility and submission service.
    pub claims: ClaimsConfig,

    /// Signer session pool sizing.
    pub pool: PoolConfig,

    /// Transfer fee and minimum-output parameters.
    pub transfer: TransferConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Remote custody signer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Base URL of the custody REST API.
    pub base_url: String,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Delay between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on one complete signing flow, in seconds.
    pub sign_timeout_secs: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fireblocks.io".to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 1000,
            sign_timeout_secs: 300,
        }
    }
}

impl SignerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sign_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_timeout_secs)
    }

    /// API key from `RELAY_SIGNER_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(SIGNER_API_KEY_ENV).ok()
    }

    /// Bearer token from `RELAY_SIGNER_TOKEN`.
    pub fn token(&self) -> Option<String> {
        std::env::var(SIGNER_TOKEN_ENV).ok()
    }
}

/// Blockfrost-style indexer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub base_url: String,

    pub request_timeout_secs: u64,

    /// Entries requested per page of the UTXO listing (max 100).
    pub page_size: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cardano-mainnet.blockfrost.io/api/v0".to_string(),
            request_timeout_secs: 30,
            page_size: 100,
        }
    }
}

impl IndexerConfig {
    /// Project id from `RELAY_INDEXER_PROJECT_ID`.
    pub fn project_id(&self) -> Option<String> {
        std::env::var(INDEXER_PROJECT_ID_ENV).ok()
    }
}

/// Claim service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Base URL of the claim API (including any `/api` prefix).
    pub base_url: String,

    /// Timeout for eligibility and history lookups, in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for claim submission, in seconds.
    pub submit_timeout_secs: u64,

    /// Hash of the terms the claimant agrees to, appended to the message.
    pub terms_hash: String,

    /// Accounts per batch in `batch` mode.
    pub batch_size: usize,

    /// Pause between batches in seconds.
    pub batch_delay_secs: u64,

    /// Pool usage percentage at which idle sessions are cleared.
    pub clear_threshold_percent: u8,

    /// Attempts per transient claim API failure.
    pub max_attempts: u32,

    /// Base delay for retry backoff in milliseconds.
    pub retry_base_ms: u64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            submit_timeout_secs: 60,
            terms_hash: String::new(),
            batch_size: 25,
            batch_delay_secs: 30,
            clear_threshold_percent: 80,
            max_attempts: 3,
            retry_base_ms: 500,
        }
    }
}

/// Signer session pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum live sessions.
    pub max_size: usize,

    /// Idle time after which a session is evicted, in seconds.
    pub idle_timeout_secs: u64,

    /// How often the sweeper runs, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 200,
            idle_timeout_secs: 1800,
            sweep_interval_secs: 300,
        }
    }
}

impl PoolConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Transfer parameters, all in lovelace except the ttl buffer (slots).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    pub fee: u64,

    pub recipient_min: u64,

    pub change_min: u64,

    pub ttl_buffer: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            fee: 200_000,
            recipient_min: 1_200_000,
            change_min: 1_200_000,
            ttl_buffer: crate::ledger::DEFAULT_TTL_BUFFER,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
