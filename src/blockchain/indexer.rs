//! UTXO indexer client.
//!
//! # Responsibilities
//! - List the spendable outputs of an address (paginated)
//! - Report the current slot for validity deadlines
//! - Broadcast signed transactions
//! - Map transport and 5xx failures to `IndexerUnavailable`, 4xx to
//!   `IndexerRejected`

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::config::IndexerConfig;
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{AssetAmounts, OutputRef, SpendableOutput};

/// Read and broadcast access to the chain for one address family.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// All spendable outputs at `address`, in indexer order.
    async fn spendable_outputs(&self, address: &str) -> RelayResult<Vec<SpendableOutput>>;

    /// Slot of the latest block.
    async fn current_slot(&self) -> RelayResult<u64>;

    /// Broadcast a finalized transaction, returning its hash.
    async fn submit_transaction(&self, cbor: &[u8]) -> RelayResult<String>;
}

#[derive(Debug, Deserialize)]
struct UtxoEntry {
    address: String,
    tx_hash: String,
    output_index: u32,
    amount: Vec<AmountEntry>,
    #[serde(default)]
    block: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AmountEntry {
    unit: String,
    quantity: String,
}

#[derive(Debug, Deserialize)]
struct LatestBlock {
    slot: Option<u64>,
}

impl UtxoEntry {
    fn into_output(self) -> RelayResult<SpendableOutput> {
        let mut amounts = AssetAmounts::new();
        for entry in self.amount {
            let qty: u64 = entry.quantity.parse().map_err(|_| {
                RelayError::IndexerUnavailable(format!(
                    "Non-numeric quantity '{}' for {}",
                    entry.quantity, entry.unit
                ))
            })?;
            *amounts.entry(entry.unit).or_insert(0) += qty;
        }
        Ok(SpendableOutput {
            output_ref: OutputRef {
                tx_hash: self.tx_hash,
                index: self.output_index,
            },
            address: self.address,
            amounts,
            block: self.block,
        })
    }
}

/// Blockfrost-shaped REST indexer.
#[derive(Clone)]
pub struct HttpIndexer {
    http: reqwest::Client,
    base_url: String,
    project_id: Option<String>,
    page_size: u32,
}

impl HttpIndexer {
    pub fn new(config: &IndexerConfig) -> RelayResult<Self> {
        Self::with_project_id(config, config.project_id())
    }

    pub fn with_project_id(config: &IndexerConfig, project_id: Option<String>) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::IndexerUnavailable(format!("HTTP client: {}", e)))?;

        if project_id.is_none() {
            tracing::warn!("Indexer project id not set; requests will be unauthenticated");
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id,
            page_size: config.page_size,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.project_id {
            Some(id) => builder.header("project_id", id),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, what: &str) -> RelayResult<reqwest::Response> {
        builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, operation = what, "Indexer request failed");
            RelayError::IndexerUnavailable(format!("{}: {}", what, e))
        })
    }
}

fn status_error(what: &str, status: StatusCode, body: &str) -> RelayError {
    tracing::warn!(operation = what, status = %status, "Indexer returned an error status");
    let message = format!("{} returned {}: {}", what, status, body);
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        RelayError::IndexerRejected(message)
    } else {
        RelayError::IndexerUnavailable(message)
    }
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn spendable_outputs(&self, address: &str) -> RelayResult<Vec<SpendableOutput>> {
        let mut outputs = Vec::new();
        let mut page = 1u32;

        loop {
            let path = format!(
                "/addresses/{}/utxos?page={}&count={}",
                address, page, self.page_size
            );
            let response = self
                .send(self.request(reqwest::Method::GET, &path), "list utxos")
                .await?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                // unused address
                break;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(status_error("list utxos", status, &body));
            }

            let entries: Vec<UtxoEntry> = response.json().await.map_err(|e| {
                RelayError::IndexerUnavailable(format!("Malformed utxo page: {}", e))
            })?;
            let fetched = entries.len();
            for entry in entries {
                outputs.push(entry.into_output()?);
            }

            if fetched < self.page_size as usize {
                break;
            }
            page += 1;
        }

        tracing::debug!(address, outputs = outputs.len(), pages = page, "Fetched spendable outputs");
        Ok(outputs)
    }

    async fn current_slot(&self) -> RelayResult<u64> {
        let response = self
            .send(self.request(reqwest::Method::GET, "/blocks/latest"), "latest block")
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("latest block", status, &body));
        }

        let block: LatestBlock = response.json().await.map_err(|e| {
            RelayError::IndexerUnavailable(format!("Malformed latest block: {}", e))
        })?;
        block
            .slot
            .ok_or_else(|| RelayError::IndexerUnavailable("Latest block has no slot".to_string()))
    }

    async fn submit_transaction(&self, cbor: &[u8]) -> RelayResult<String> {
        let builder = self
            .request(reqwest::Method::POST, "/tx/submit")
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(cbor.to_vec());
        let response = self.send(builder, "submit tx").await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("submit tx", status, &body));
        }

        let tx_hash: String = response.json().await.map_err(|e| {
            RelayError::IndexerUnavailable(format!("Malformed submit response: {}", e))
        })?;
        tracing::info!(tx_hash = %tx_hash, "Transaction submitted");
        Ok(tx_hash)
    }
}

impl std::fmt::Debug for HttpIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIndexer")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("authenticated", &self.project_id.is_some())
            .finish()
    }
}
