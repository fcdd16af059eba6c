//! Claim workflow for a single account.
//!
//! ```text
//! acquire session → eligibility → history → sign → submit → release
//! ```
//!
//! The session is released on every path, including errors.

use std::sync::Arc;

use crate::blockchain::Chain;
use crate::claims::client::ClaimApi;
use crate::claims::encoder::build_submission;
use crate::claims::types::{claim_message, Allocation, ClaimOutcome};
use crate::error::{RelayResult, ResultExt};
use crate::observability::metrics;
use crate::pool::{SessionFactory, SessionPool, SignerSession};

/// Runs claims through pooled signer sessions.
pub struct ClaimWorkflow<F: SessionFactory<Session = SignerSession>> {
    pool: Arc<SessionPool<F>>,
    claims: Arc<dyn ClaimApi>,
    terms_hash: String,
}

impl<F: SessionFactory<Session = SignerSession>> ClaimWorkflow<F> {
    pub fn new(pool: Arc<SessionPool<F>>, claims: Arc<dyn ClaimApi>, terms_hash: impl Into<String>) -> Self {
        Self {
            pool,
            claims,
            terms_hash: terms_hash.into(),
        }
    }

    pub fn pool(&self) -> &Arc<SessionPool<F>> {
        &self.pool
    }

    pub fn claims(&self) -> &Arc<dyn ClaimApi> {
        &self.claims
    }

    /// Claim the allocation of `account` on `chain`, paid to `destination`.
    pub async fn process(&self, account: &str, chain: Chain, destination: &str) -> RelayResult<ClaimOutcome> {
        let result = self.run(account, chain, destination).await;
        self.pool.release(account);

        match &result {
            Ok(outcome) => {
                metrics::record_claim(outcome.label());
                tracing::info!(account, %chain, outcome = outcome.label(), "Claim workflow finished");
            }
            Err(e) => {
                metrics::record_claim("failed");
                tracing::warn!(account, %chain, error = %e, "Claim workflow failed");
            }
        }
        result
    }

    /// Positive allocation of `account` on `chain`, without claiming it.
    pub async fn allocation(&self, account: &str, chain: Chain) -> RelayResult<Option<Allocation>> {
        let result = async {
            let session = self.pool.acquire(account, chain).await.context(account, chain, "acquire session")?;
            self.claims
                .check_eligibility(chain, session.address())
                .await
                .context(account, chain, "check eligibility")
        }
        .await;
        self.pool.release(account);
        result
    }

    async fn run(&self, account: &str, chain: Chain, destination: &str) -> RelayResult<ClaimOutcome> {
        let session = self.pool.acquire(account, chain).await.context(account, chain, "acquire session")?;
        let address = session.address();

        let allocation = match self
            .claims
            .check_eligibility(chain, address)
            .await
            .context(account, chain, "check eligibility")?
        {
            Some(allocation) => allocation,
            None => return Ok(ClaimOutcome::Unclaimable),
        };

        let history = self
            .claims
            .claim_history(chain, address)
            .await
            .context(account, chain, "claim history")?;
        if !history.is_empty() {
            return Ok(ClaimOutcome::AlreadyClaimed { claims: history.len() });
        }

        let amount = allocation.value.to_string();
        let message = claim_message(&amount, destination, &self.terms_hash);
        let signed = session.sign_claim(&message).await?;
        let submission = build_submission(chain, address, &amount, destination, &message, &signed)
            .context(account, chain, "encode claim")?;

        let receipt = self
            .claims
            .submit_claim(chain, &submission)
            .await
            .context(account, chain, "submit claim")?;

        Ok(ClaimOutcome::Claimed { amount, receipt })
    }
}
