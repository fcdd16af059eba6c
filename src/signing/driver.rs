//! Signing request lifecycle.
//!
//! ```text
//! BUILD_PAYLOAD → SUBMIT → POLL ─┬→ COMPLETE
//!                                └→ TERMINAL_FAILURE
//! ```
//!
//! The poll loop has no attempt limit. A request that never reaches a
//! terminal status polls until the caller's timeout drops the future; the
//! remote request is then left outstanding.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{RelayError, RelayResult};
use crate::observability::metrics;
use crate::signing::client::RemoteSigner;
use crate::signing::types::{SigningRequest, SigningResult, StatusSnapshot};

/// A completed signature and the number of status polls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutcome {
    pub result: SigningResult,
    pub polls: u32,
}

/// Submits signing requests and waits for them to finish.
#[derive(Clone)]
pub struct SigningDriver {
    signer: Arc<dyn RemoteSigner>,
    poll_interval: Duration,
}

impl SigningDriver {
    pub fn new(signer: Arc<dyn RemoteSigner>, poll_interval: Duration) -> Self {
        Self { signer, poll_interval }
    }

    /// Submit `request` and poll until it completes or fails.
    pub async fn sign(&self, request: &SigningRequest) -> RelayResult<SigningOutcome> {
        let result = self.run(request).await;
        let outcome = match &result {
            Ok(_) => "completed",
            Err(RelayError::RemoteSignerTerminalFailure { .. }) => "rejected",
            Err(_) => "error",
        };
        metrics::record_signing(request.chain, outcome);
        result
    }

    async fn run(&self, request: &SigningRequest) -> RelayResult<SigningOutcome> {
        let submitted = self.signer.create_request(request).await?;
        let id = submitted.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            RelayError::MalformedSignerResponse(
                "Signing request accepted without an id".to_string(),
            )
        })?;

        tracing::info!(
            id = %id,
            account = %request.account_id,
            chain = %request.chain,
            operation = ?request.operation,
            "Signing request submitted"
        );

        let mut polls = 0u32;
        let snapshot = loop {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let snapshot = self.signer.request_status(&id).await?;
            if snapshot.status.is_success() {
                break snapshot;
            }
            if snapshot.status.is_failure() {
                tracing::warn!(
                    id = %id,
                    status = snapshot.status.as_str(),
                    sub_status = %snapshot.sub_status,
                    polls,
                    "Signing request failed"
                );
                metrics::record_polls(request.chain, polls);
                return Err(RelayError::RemoteSignerTerminalFailure {
                    id,
                    status: snapshot.status.as_str().to_string(),
                    sub_status: snapshot.sub_status,
                    polls,
                });
            }

            tracing::debug!(id = %id, status = snapshot.status.as_str(), polls, "Waiting for signature");
        };

        metrics::record_polls(request.chain, polls);
        let result = extract_result(&id, snapshot)?;
        tracing::info!(id = %id, polls, "Signing request completed");
        Ok(SigningOutcome { result, polls })
    }
}

/// First signed message with signature, public key and algorithm present.
fn extract_result(id: &str, snapshot: StatusSnapshot) -> RelayResult<SigningResult> {
    let missing = |what: &str| {
        RelayError::MalformedSignerResponse(format!("Request {} completed without {}", id, what))
    };

    let message = snapshot
        .signed_messages
        .into_iter()
        .next()
        .ok_or_else(|| missing("signed messages"))?;

    Ok(SigningResult {
        signature: message.signature.ok_or_else(|| missing("a signature"))?,
        public_key: message.public_key.ok_or_else(|| missing("a public key"))?,
        algorithm: message.algorithm.ok_or_else(|| missing("an algorithm"))?,
        content: message.content,
    })
}
