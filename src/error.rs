//! Error taxonomy shared by every subsystem.
//!
//! Nothing in the core swallows an error. Failures are wrapped with the
//! account, chain and operation that produced them via [`ResultExt::context`]
//! and handed back to the caller.

use thiserror::Error;

use crate::blockchain::Chain;

/// Errors produced while selecting outputs, signing, or managing sessions.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Bad chain/asset combination or otherwise unusable request input.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// Not enough funds to cover the request.
    #[error(
        "Insufficient balance: native required {required_native}, accumulated {available_native}; \
         token required {required_token}, accumulated {available_token}"
    )]
    InsufficientBalance {
        required_native: u128,
        available_native: u128,
        required_token: u128,
        available_token: u128,
    },

    /// No spendable output holds the requested token.
    #[error("No spendable outputs hold token {0}")]
    NoMatchingOutputs(String),

    /// Pool is at capacity and no idle session can be reclaimed.
    #[error("Session pool exhausted: {max_size} sessions active")]
    PoolExhausted { max_size: usize },

    /// The remote signer reached a failure state.
    #[error("Signing request {id} ended in {status} ({sub_status}) after {polls} polls")]
    RemoteSignerTerminalFailure {
        id: String,
        status: String,
        sub_status: String,
        polls: u32,
    },

    /// The remote signer answered with something this client cannot use.
    #[error("Malformed signer response: {0}")]
    MalformedSignerResponse(String),

    /// The remote signer could not be reached or returned a transport error.
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    /// Transaction serialization failed.
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// The indexer could not be reached. Callers should retry with backoff.
    #[error("Indexer unavailable: {0}")]
    IndexerUnavailable(String),

    /// Indexer answered 4xx. The same request will fail again.
    #[error("Indexer rejected request: {0}")]
    IndexerRejected(String),

    /// Claim service unreachable or answering 5xx.
    #[error("Claim API error: {0}")]
    ClaimApi(String),

    /// Claim service refused the request with a 4xx status.
    #[error("Claim rejected: {0}")]
    ClaimRejected(String),

    /// Internal accounting went wrong; never clamped or ignored.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A caller-imposed deadline elapsed.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Another error annotated with the request it belongs to.
    #[error("{operation} failed for account {account} on {chain}: {source}")]
    Context {
        account: String,
        chain: Chain,
        operation: &'static str,
        #[source]
        source: Box<RelayError>,
    },
}

impl RelayError {
    /// Innermost error, skipping any context layers.
    pub fn root(&self) -> &RelayError {
        match self {
            RelayError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether a caller may retry the operation later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root(),
            RelayError::IndexerUnavailable(_)
                | RelayError::SignerUnavailable(_)
                | RelayError::ClaimApi(_)
                | RelayError::PoolExhausted { .. }
        )
    }
}

/// Result type used across the crate.
pub type RelayResult<T> = Result<T, RelayError>;

/// Attach request context to an error.
pub trait ResultExt<T> {
    fn context(self, account: &str, chain: Chain, operation: &'static str) -> RelayResult<T>;
}

impl<T> ResultExt<T> for RelayResult<T> {
    fn context(self, account: &str, chain: Chain, operation: &'static str) -> RelayResult<T> {
        self.map_err(|e| RelayError::Context {
            account: account.to_string(),
            chain,
            operation,
            source: Box::new(e),
        })
    }
}
