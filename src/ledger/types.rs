//! UTXO ledger types used by coin selection and transaction assembly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::blockchain::types::LOVELACE;

/// Quantities keyed by asset unit (`lovelace` or `policy_id ‖ asset_name` hex).
pub type AssetAmounts = BTreeMap<String, u64>;

/// Identifier of a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_hash: String,
    pub index: u32,
}

/// An output the source address can spend, as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableOutput {
    pub output_ref: OutputRef,
    pub address: String,
    pub amounts: AssetAmounts,
    /// Block the output was created in, when known.
    #[serde(default)]
    pub block: Option<String>,
}

impl SpendableOutput {
    /// Quantity held of `unit`, zero when absent.
    pub fn quantity(&self, unit: &str) -> u64 {
        self.amounts.get(unit).copied().unwrap_or(0)
    }

    /// Native currency held.
    pub fn native(&self) -> u64 {
        self.quantity(LOVELACE)
    }
}

/// What a selection must cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTarget {
    pub token_unit: String,
    pub token_amount: u64,
    pub fee: u64,
    pub recipient_min: u64,
    pub change_min: u64,
}

impl SelectionTarget {
    /// Native currency needed to pay the recipient and the fee.
    pub fn native_floor(&self) -> u128 {
        self.recipient_min as u128 + self.fee as u128
    }

    /// Native currency needed once a change output is included.
    pub fn native_threshold(&self) -> u128 {
        self.native_floor() + self.change_min as u128
    }
}

/// Outputs chosen to fund a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    pub selected: Vec<SpendableOutput>,
    pub native_total: u128,
    pub token_total: u128,
}

impl SelectionResult {
    /// Per-unit totals over every selected output.
    pub fn totals(&self) -> BTreeMap<String, u128> {
        let mut totals = BTreeMap::new();
        for output in &self.selected {
            for (unit, qty) in &output.amounts {
                *totals.entry(unit.clone()).or_insert(0u128) += *qty as u128;
            }
        }
        totals
    }
}

/// A token transfer requested on behalf of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    pub token_unit: String,
    pub token_amount: u64,
    pub fee: u64,
    pub recipient_min: u64,
    pub change_min: u64,
}

impl TransferRequest {
    pub fn target(&self) -> SelectionTarget {
        SelectionTarget {
            token_unit: self.token_unit.clone(),
            token_amount: self.token_amount,
            fee: self.fee,
            recipient_min: self.recipient_min,
            change_min: self.change_min,
        }
    }
}

/// One transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutput {
    pub address: String,
    pub amounts: AssetAmounts,
}

/// Unsigned transfer: inputs, outputs (recipient first, change second),
/// fee, and validity deadline as an absolute slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsignedTransaction {
    pub inputs: Vec<OutputRef>,
    pub outputs: Vec<TxOutput>,
    pub fee: u64,
    pub ttl: u64,
}

impl UnsignedTransaction {
    /// Whether inputs == outputs + fee for every asset unit.
    pub fn is_balanced(&self, input_totals: &BTreeMap<String, u128>) -> bool {
        let mut spent: BTreeMap<String, u128> = BTreeMap::new();
        for output in &self.outputs {
            for (unit, qty) in &output.amounts {
                *spent.entry(unit.clone()).or_insert(0) += *qty as u128;
            }
        }
        *spent.entry(LOVELACE.to_string()).or_insert(0) += self.fee as u128;

        spent.retain(|_, qty| *qty > 0);
        let inputs: BTreeMap<_, _> = input_totals
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(u, q)| (u.clone(), *q))
            .collect();
        spent == inputs
    }
}

/// Serialized transaction body together with the hash that gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBody {
    pub bytes: Vec<u8>,
    pub signing_hash: [u8; 32],
}

impl SerializedBody {
    /// Transaction id as lowercase hex.
    pub fn tx_hash(&self) -> String {
        hex::encode(self.signing_hash)
    }
}

/// Public key and signature authorising the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A fully signed transfer, ready to broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct SignedTransfer {
    pub tx_hash: String,
    pub cbor_hex: String,
    pub transaction: UnsignedTransaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(native: u64, token: u64) -> SpendableOutput {
        let mut amounts = AssetAmounts::new();
        amounts.insert(LOVELACE.to_string(), native);
        if token > 0 {
            amounts.insert("tok".to_string(), token);
        }
        SpendableOutput {
            output_ref: OutputRef { tx_hash: "aa".into(), index: 0 },
            address: "addr".into(),
            amounts,
            block: None,
        }
    }

    #[test]
    fn test_quantity_defaults_to_zero() {
        let out = output(5, 0);
        assert_eq!(out.native(), 5);
        assert_eq!(out.quantity("tok"), 0);
    }

    #[test]
    fn test_thresholds() {
        let target = SelectionTarget {
            token_unit: "tok".into(),
            token_amount: 1,
            fee: 200_000,
            recipient_min: 1_200_000,
            change_min: 1_200_000,
        };
        assert_eq!(target.native_floor(), 1_400_000);
        assert_eq!(target.native_threshold(), 2_600_000);
    }

    #[test]
    fn test_balance_check() {
        let selection = SelectionResult {
            selected: vec![output(10, 4)],
            native_total: 10,
            token_total: 4,
        };
        let mut recipient = AssetAmounts::new();
        recipient.insert(LOVELACE.into(), 5);
        recipient.insert("tok".into(), 4);
        let mut change = AssetAmounts::new();
        change.insert(LOVELACE.into(), 3);

        let tx = UnsignedTransaction {
            inputs: vec![],
            outputs: vec![
                TxOutput { address: "r".into(), amounts: recipient },
                TxOutput { address: "s".into(), amounts: change },
            ],
            fee: 2,
            ttl: 0,
        };
        assert!(tx.is_balanced(&selection.totals()));

        let unbalanced = UnsignedTransaction { fee: 1, ..tx };
        assert!(!unbalanced.is_balanced(&selection.totals()));
    }
}
