//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! relay.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → sections handed to the signer, indexer, claims client and pool
//!
//! RELAY_SIGNER_API_KEY / RELAY_SIGNER_TOKEN / RELAY_INDEXER_PROJECT_ID
//!     → read at client construction, never stored in the file
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClaimsConfig, IndexerConfig, ObservabilityConfig, PoolConfig, RelayConfig, SignerConfig,
    TransferConfig,
};
pub use validation::{validate_config, ValidationError};
