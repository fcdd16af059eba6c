//! Claim eligibility and submission API client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::blockchain::Chain;
use crate::claims::types::{Allocation, ClaimReceipt, ClaimRecord, ClaimSubmission};
use crate::config::ClaimsConfig;
use crate::error::{RelayError, RelayResult};

/// The claim service.
#[async_trait]
pub trait ClaimApi: Send + Sync {
    /// Positive allocation for `address`, or `None` when not eligible.
    async fn check_eligibility(&self, chain: Chain, address: &str) -> RelayResult<Option<Allocation>>;

    async fn claim_history(&self, chain: Chain, address: &str) -> RelayResult<Vec<ClaimRecord>>;

    async fn submit_claim(&self, chain: Chain, submission: &ClaimSubmission) -> RelayResult<ClaimReceipt>;
}

#[derive(Debug, Deserialize)]
struct EligibilityResponse {
    #[serde(default)]
    value: Option<serde_json::Number>,
}

/// reqwest-backed [`ClaimApi`].
#[derive(Debug, Clone)]
pub struct HttpClaimApi {
    http: reqwest::Client,
    base_url: String,
    submit_timeout: Duration,
}

impl HttpClaimApi {
    pub fn new(config: &ClaimsConfig) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::ClaimApi(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport(what: &str, e: reqwest::Error) -> RelayError {
    tracing::warn!(error = %e, operation = what, "Claim API request failed");
    RelayError::ClaimApi(format!("{}: {}", what, e))
}

async fn status_error(what: &str, response: reqwest::Response) -> RelayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(operation = what, status = %status, "Claim API returned an error status");
    let message = format!("{} returned {}: {}", what, status, body);
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        RelayError::ClaimRejected(message)
    } else {
        RelayError::ClaimApi(message)
    }
}

#[async_trait]
impl ClaimApi for HttpClaimApi {
    async fn check_eligibility(&self, chain: Chain, address: &str) -> RelayResult<Option<Allocation>> {
        let what = "check eligibility";
        let response = self
            .http
            .get(self.url(&format!("/check/{}/{}", chain, address)))
            .send()
            .await
            .map_err(|e| transport(what, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(what, response).await);
        }

        let body: EligibilityResponse = response
            .json()
            .await
            .map_err(|e| RelayError::ClaimApi(format!("{} response: {}", what, e)))?;

        let allocation = body.value.map(|value| Allocation { value }).filter(Allocation::is_positive);
        tracing::debug!(%chain, address, eligible = allocation.is_some(), "Eligibility checked");
        Ok(allocation)
    }

    async fn claim_history(&self, chain: Chain, address: &str) -> RelayResult<Vec<ClaimRecord>> {
        let what = "claim history";
        let response = self
            .http
            .get(self.url(&format!("/claims/{}/{}", chain, address)))
            .send()
            .await
            .map_err(|e| transport(what, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(what, response).await);
        }

        let claims: Option<Vec<ClaimRecord>> = response
            .json()
            .await
            .map_err(|e| RelayError::ClaimApi(format!("{} response: {}", what, e)))?;
        Ok(claims.unwrap_or_default())
    }

    async fn submit_claim(&self, chain: Chain, submission: &ClaimSubmission) -> RelayResult<ClaimReceipt> {
        let what = "submit claim";
        let response = self
            .http
            .post(self.url(&format!("/claims/{}", chain)))
            .timeout(self.submit_timeout)
            .json(submission)
            .send()
            .await
            .map_err(|e| transport(what, e))?;

        if !response.status().is_success() {
            return Err(status_error(what, response).await);
        }

        let receipt: ClaimReceipt = response
            .json()
            .await
            .map_err(|e| RelayError::ClaimApi(format!("{} response: {}", what, e)))?;
        tracing::info!(%chain, address = %submission.address, "Claim accepted");
        Ok(receipt)
    }
}
