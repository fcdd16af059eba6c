//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (account, chain, request id) on every event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
