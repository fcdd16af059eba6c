//! Signer session pool.
//!
//! # Data Flow
//! ```text
//! acquire(account, chain)
//!     → registry.rs (idle hit | build via SessionFactory | reclaim LRU idle | PoolExhausted)
//!     → session.rs (SignerSession: sign claim, transfer, broadcast)
//! release(account)
//!     → every session of the account becomes idle
//! sweeper.rs
//!     → evict_idle() on an interval until shutdown
//! ```

pub mod registry;
pub mod session;
pub mod sweeper;

pub use registry::{PoolMetrics, SessionPool};
pub use session::{CustodySessionFactory, SessionFactory, SessionKey, SignerSession};
pub use sweeper::PoolSweeper;
