//! Remote signing subsystem.
//!
//! # Data Flow
//! ```text
//! claim message / tx signing hash
//!     → payload.rs (per-chain encoding → SigningRequest)
//!     → driver.rs (submit, poll until terminal)
//!         ↔ client.rs (custody REST API)
//!     → decode.rs (per-chain signature recombination)
//! ```

pub mod client;
pub mod decode;
pub mod driver;
pub mod payload;
pub mod types;

pub use client::{HttpRemoteSigner, RemoteSigner};
pub use decode::decode_signature;
pub use driver::{SigningDriver, SigningOutcome};
pub use payload::ClaimPayload;
pub use types::{
    MessageKind, RequestStatus, SignatureShape, SignedMessage, SigningOperation, SigningRequest,
    SigningResult, StatusSnapshot, SubmittedRequest, UnsignedMessage,
};
