//! Token claim subsystem.
//!
//! # Data Flow
//! ```text
//! (account, asset id)
//!     → workflow.rs (acquire session, eligibility, history, sign, submit, release)
//!         ↔ client.rs (claim REST API)
//!     → encoder.rs (per-chain submission body)
//! account export (CSV)
//!     → batch.rs (batches, pool clearing, retries, CSV report)
//!     → allocation.rs (eligibility only, allocations report)
//! ```

pub mod allocation;
pub mod batch;
pub mod client;
pub mod encoder;
pub mod types;
pub mod workflow;

pub use allocation::{AllocationChecker, AllocationReport, AllocationRow};
pub use batch::{
    read_accounts, AccountRow, BatchOptions, BatchReport, BatchRunner, BatchTotals, ClaimStatus, ReportRow,
};
pub use client::{ClaimApi, HttpClaimApi};
pub use encoder::{build_submission, verify_evm_signer};
pub use types::{claim_message, Allocation, ClaimOutcome, ClaimReceipt, ClaimRecord, ClaimSubmission};
pub use workflow::ClaimWorkflow;
