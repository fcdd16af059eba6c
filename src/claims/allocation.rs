//! Allocation lookup over an account export.
//!
//! Every row with an account and asset id is checked against the claim API
//! and written back with the current claimable amount. Rows the API reports
//! nothing for keep the amount the export already had. Nothing is signed.

use serde::Serialize;
use std::io;
use std::path::Path;

use crate::blockchain::Chain;
use crate::claims::batch::{AccountRow, BatchOptions};
use crate::claims::workflow::ClaimWorkflow;
use crate::pool::{SessionFactory, SignerSession};
use crate::resilience::retry_transient;

const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// One row of the allocations report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationRow {
    #[serde(rename = "Account Id")]
    pub account_id: String,
    #[serde(rename = "Account Name")]
    pub account_name: String,
    #[serde(rename = "Asset Id")]
    pub asset_id: String,
    #[serde(rename = "Claimable Amount")]
    pub claimable_amount: String,
    #[serde(rename = "Original Claimable Amount")]
    pub original_amount: String,
    #[serde(rename = "Allocation Check Result")]
    pub result: String,
    #[serde(skip)]
    pub found: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    pub rows: Vec<AllocationRow>,
    /// Rows dropped for a missing account or asset id.
    pub skipped: usize,
}

impl AllocationReport {
    pub fn found(&self) -> usize {
        self.rows.iter().filter(|r| r.found).count()
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()
    }
}

pub struct AllocationChecker<F: SessionFactory<Session = SignerSession>> {
    workflow: ClaimWorkflow<F>,
    options: BatchOptions,
}

impl<F: SessionFactory<Session = SignerSession>> AllocationChecker<F> {
    pub fn new(workflow: ClaimWorkflow<F>, options: BatchOptions) -> Self {
        Self { workflow, options }
    }

    pub async fn run(&self, rows: &[AccountRow], report_path: Option<&Path>) -> io::Result<AllocationReport> {
        let mut report = AllocationReport::default();

        for row in rows {
            let account = row.account_id.trim();
            let asset = row.asset_id.trim();
            if account.is_empty() || asset.is_empty() {
                tracing::warn!(?row, "Skipping row with missing account or asset id");
                report.skipped += 1;
                continue;
            }
            report.rows.push(self.check_row(row, account, asset).await);
        }

        if let Some(path) = report_path {
            report.write_to(path)?;
        }
        tracing::info!(
            checked = report.rows.len(),
            found = report.found(),
            skipped = report.skipped,
            "Allocation check complete"
        );
        Ok(report)
    }

    async fn check_row(&self, row: &AccountRow, account: &str, asset: &str) -> AllocationRow {
        let original = row.claimable_amount.trim().to_string();
        let lookup = match Chain::from_asset_id(asset) {
            Ok(chain) => {
                let workflow = &self.workflow;
                retry_transient(
                    self.options.max_attempts,
                    self.options.retry_base_ms,
                    MAX_RETRY_DELAY_MS,
                    move || workflow.allocation(account, chain),
                )
                .await
            }
            Err(e) => Err(e),
        };

        let (claimable_amount, found) = match lookup {
            Ok(Some(allocation)) => (allocation.value.to_string(), true),
            Ok(None) => (original.clone(), false),
            Err(e) => {
                tracing::warn!(account, asset, error = %e, "Allocation lookup failed");
                (original.clone(), false)
            }
        };

        AllocationRow {
            account_id: account.to_string(),
            account_name: row.account_name.trim().to_string(),
            asset_id: asset.to_string(),
            claimable_amount,
            original_amount: original,
            result: if found { "Success" } else { "Failed/Using Original" }.to_string(),
            found,
        }
    }
}
