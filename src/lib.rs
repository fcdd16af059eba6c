//! Custody signing relay library.
//!
//! Drives a remote custody signer for token claims and UTXO transfers,
//! keeping one pooled signer session per account and chain.

// Core subsystems
pub mod config;
pub mod error;
pub mod pool;
pub mod signing;

// Chain-facing
pub mod blockchain;
pub mod codec;
pub mod ledger;

// Workflows
pub mod claims;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use blockchain::Chain;
pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use lifecycle::Shutdown;
pub use pool::{SessionPool, SignerSession};
