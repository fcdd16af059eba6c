//! Batched claim processing over an account export.
//!
//! Accounts are processed in fixed-size batches. Before each batch the pool
//! is cleared of idle sessions if its usage is at or above the configured
//! threshold; between batches the runner pauses. The CSV report is rewritten
//! after every batch so an interrupted run keeps its progress.
//!
//! Input and report share the custody export's column names:
//! `Account Id`, `Account Name`, `Asset Id`, `Claimable Amount`, with
//! `Eligibility Status`, `Claim Status` and `Claim Result` added on output.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::blockchain::Chain;
use crate::claims::types::{ClaimOutcome, ClaimReceipt};
use crate::claims::workflow::ClaimWorkflow;
use crate::config::ClaimsConfig;
use crate::pool::{SessionFactory, SignerSession};
use crate::resilience::retry_transient;

/// Upper bound on a single retry delay.
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// One row of the account export. Unknown columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    #[serde(rename = "Account Id")]
    pub account_id: String,
    #[serde(rename = "Account Name", default)]
    pub account_name: String,
    /// Custody asset id, e.g. `ADA` or `ETH_TEST5`.
    #[serde(rename = "Asset Id")]
    pub asset_id: String,
    /// Amount already recorded in the export, kept when no fresh value is known.
    #[serde(rename = "Claimable Amount", default)]
    pub claimable_amount: String,
}

/// Read an account export with a header row.
pub fn read_accounts(path: &Path) -> io::Result<Vec<AccountRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<AccountRow>, _>>()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Accounts loaded");
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Claimed,
    AlreadyClaimed,
    Unclaimable,
    Failed,
    /// Row lacked an account or asset id.
    Skipped,
}

impl ClaimStatus {
    fn eligibility_label(self) -> &'static str {
        match self {
            ClaimStatus::Claimed | ClaimStatus::AlreadyClaimed => "Eligible",
            ClaimStatus::Unclaimable => "Unclaimable",
            ClaimStatus::Failed | ClaimStatus::Skipped => "Unknown",
        }
    }

    fn claim_label(self) -> &'static str {
        match self {
            ClaimStatus::Claimed => "Claimed Successfully",
            ClaimStatus::AlreadyClaimed => "Already Claimed",
            ClaimStatus::Unclaimable => "Skipped",
            ClaimStatus::Failed => "Claim Failed",
            ClaimStatus::Skipped => "Not Processed",
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub account_id: String,
    pub account_name: String,
    pub asset_id: String,
    /// Claimable amount as carried in from the export.
    pub original_amount: String,
    pub status: ClaimStatus,
    pub amount: Option<String>,
    pub receipt: Option<ClaimReceipt>,
    pub error: Option<String>,
}

/// A report row as written to CSV.
#[derive(Serialize)]
struct ReportRecord<'a> {
    #[serde(rename = "Account Id")]
    account_id: &'a str,
    #[serde(rename = "Account Name")]
    account_name: &'a str,
    #[serde(rename = "Asset Id")]
    asset_id: &'a str,
    #[serde(rename = "Claimable Amount")]
    claimable_amount: &'a str,
    #[serde(rename = "Eligibility Status")]
    eligibility_status: &'static str,
    #[serde(rename = "Claim Status")]
    claim_status: &'static str,
    #[serde(rename = "Claim Result")]
    claim_result: String,
}

impl ReportRow {
    fn record(&self) -> ReportRecord<'_> {
        let claim_result = match (&self.receipt, &self.error) {
            (Some(receipt), _) => receipt.0.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => "N/A".to_string(),
        };
        ReportRecord {
            account_id: &self.account_id,
            account_name: &self.account_name,
            asset_id: &self.asset_id,
            claimable_amount: self.amount.as_deref().unwrap_or(&self.original_amount),
            eligibility_status: self.status.eligibility_label(),
            claim_status: self.status.claim_label(),
            claim_result,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTotals {
    pub processed: usize,
    pub claimed: usize,
    pub already_claimed: usize,
    pub unclaimable: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchTotals {
    fn count(&mut self, status: ClaimStatus) {
        self.processed += 1;
        match status {
            ClaimStatus::Claimed => self.claimed += 1,
            ClaimStatus::AlreadyClaimed => self.already_claimed += 1,
            ClaimStatus::Unclaimable => self.unclaimable += 1,
            ClaimStatus::Failed => self.failed += 1,
            ClaimStatus::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub batches: usize,
    pub totals: BatchTotals,
    pub rows: Vec<ReportRow>,
}

impl BatchReport {
    fn push(&mut self, row: ReportRow) {
        self.totals.count(row.status);
        self.rows.push(row);
    }

    /// Write every row so far as CSV, replacing `path`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row.record())?;
        }
        writer.flush()
    }
}

/// Batch tuning, normally taken from `[claims]`.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub clear_threshold_percent: u8,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
}

impl From<&ClaimsConfig> for BatchOptions {
    fn from(config: &ClaimsConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_secs(config.batch_delay_secs),
            clear_threshold_percent: config.clear_threshold_percent,
            max_attempts: config.max_attempts.max(1),
            retry_base_ms: config.retry_base_ms,
        }
    }
}

pub struct BatchRunner<F: SessionFactory<Session = SignerSession>> {
    workflow: ClaimWorkflow<F>,
    options: BatchOptions,
}

impl<F: SessionFactory<Session = SignerSession>> BatchRunner<F> {
    pub fn new(workflow: ClaimWorkflow<F>, options: BatchOptions) -> Self {
        Self { workflow, options }
    }

    /// Claim for every row, paying to `destination`. When `report_path` is
    /// given the report is written after each batch.
    pub async fn run(
        &self,
        rows: &[AccountRow],
        destination: &str,
        report_path: Option<&Path>,
    ) -> io::Result<BatchReport> {
        let mut report = BatchReport::default();
        let total_batches = rows.len().div_ceil(self.options.batch_size);

        for (index, batch) in rows.chunks(self.options.batch_size).enumerate() {
            tracing::info!(batch = index + 1, of = total_batches, rows = batch.len(), "Processing batch");
            self.clear_pool_if_needed();

            for row in batch {
                let result = self.process_row(row, destination).await;
                report.push(result);
            }
            report.batches += 1;

            if let Some(path) = report_path {
                report.write_to(path)?;
            }
            tracing::info!(
                batch = index + 1,
                claimed = report.totals.claimed,
                failed = report.totals.failed,
                processed = report.totals.processed,
                "Batch complete"
            );

            if index + 1 < total_batches && !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }
        }

        Ok(report)
    }

    fn clear_pool_if_needed(&self) {
        let pool = self.workflow.pool();
        let usage = pool.metrics().usage_percent();
        if usage >= self.options.clear_threshold_percent as f64 {
            tracing::info!(usage_percent = usage, "Pool usage high, clearing idle sessions");
            pool.clear_idle();
        }
    }

    async fn process_row(&self, row: &AccountRow, destination: &str) -> ReportRow {
        let mut report = ReportRow {
            account_id: row.account_id.trim().to_string(),
            account_name: row.account_name.trim().to_string(),
            asset_id: row.asset_id.trim().to_string(),
            original_amount: row.claimable_amount.trim().to_string(),
            status: ClaimStatus::Skipped,
            amount: None,
            receipt: None,
            error: None,
        };
        if report.account_id.is_empty() || report.asset_id.is_empty() {
            tracing::warn!(?row, "Skipping row with missing account or asset id");
            return report;
        }

        let chain = match Chain::from_asset_id(&report.asset_id) {
            Ok(chain) => chain,
            Err(e) => {
                report.status = ClaimStatus::Failed;
                report.error = Some(e.to_string());
                return report;
            }
        };

        let workflow = &self.workflow;
        let account = report.account_id.as_str();
        let result = retry_transient(
            self.options.max_attempts,
            self.options.retry_base_ms,
            MAX_RETRY_DELAY_MS,
            move || workflow.process(account, chain, destination),
        )
        .await;

        match result {
            Ok(ClaimOutcome::Claimed { amount, receipt }) => {
                report.status = ClaimStatus::Claimed;
                report.amount = Some(amount);
                report.receipt = Some(receipt);
            }
            Ok(ClaimOutcome::AlreadyClaimed { .. }) => report.status = ClaimStatus::AlreadyClaimed,
            Ok(ClaimOutcome::Unclaimable) => report.status = ClaimStatus::Unclaimable,
            Err(e) => {
                report.status = ClaimStatus::Failed;
                report.error = Some(e.to_string());
            }
        }
        report
    }
}
