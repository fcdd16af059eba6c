//! Byte-level encodings shared by the payload builders and the serializer.
//!
//! # Data Flow
//! ```text
//! claim message ─▶ cose.rs (CIP-8 Sig_structure / COSE_Sign1 / COSE_Key)
//! tx body       ─▶ cbor.rs (definite-length CBOR writer)
//! addr1...      ─▶ address.rs (bech32 → raw bytes)
//! ```

pub mod address;
pub mod cbor;
pub mod cose;

pub use address::bech32_address_bytes;
pub use cbor::CborWriter;
pub use cose::{ed25519_cose_key, CoseMessage};
