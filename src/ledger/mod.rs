//! UTXO transfer pipeline.
//!
//! # Data Flow
//! ```text
//! indexer outputs
//!     → selection.rs (largest-first coin selection)
//!     → assembler.rs (recipient + change outputs, ttl)
//!     → serializer.rs (CBOR body, Blake2b-256 signing hash, witness set)
//! ```

pub mod assembler;
pub mod selection;
pub mod serializer;
pub mod types;

pub use assembler::{assemble_transfer, validity_deadline, DEFAULT_TTL_BUFFER};
pub use selection::select_outputs;
pub use serializer::{CardanoSerializer, TransactionSerializer};
pub use types::{
    AssetAmounts, OutputRef, SelectionResult, SelectionTarget, SignedTransfer, SpendableOutput,
    TransferRequest, TxOutput, UnsignedTransaction, Witness,
};
