//! Chain identifiers and chain-facing clients.
//!
//! # Data Flow
//! ```text
//! asset id / CLI chain name
//!     → types.rs (Chain, signing algorithm, derivation path)
//!
//! RELAY_INDEXER_PROJECT_ID, indexer base URL
//!     → indexer.rs (utxos, latest slot, tx submit with timeouts)
//! ```
//!
//! # Security Constraints
//! - Project ids ONLY from environment variables
//! - Never log credentials
//! - All indexer calls have configurable timeouts

pub mod indexer;
pub mod types;

pub use indexer::{HttpIndexer, Indexer};
pub use types::{cardano_derivation_path, Chain, SigningAlgorithm, LOVELACE};
