//! Builds the two-output transfer transaction from a selection.

use std::collections::BTreeMap;

use crate::blockchain::types::LOVELACE;
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{
    AssetAmounts, SelectionResult, TransferRequest, TxOutput, UnsignedTransaction,
};

/// Slots a transaction stays valid for by default.
pub const DEFAULT_TTL_BUFFER: u64 = 2600;

/// Absolute validity deadline `current_slot + buffer`.
pub fn validity_deadline(current_slot: u64, buffer: u64) -> RelayResult<u64> {
    current_slot.checked_add(buffer).ok_or_else(|| {
        RelayError::InvariantViolation(format!(
            "Validity deadline overflows: slot {} + buffer {}",
            current_slot, buffer
        ))
    })
}

/// Recipient gets exactly the requested token amount and the recipient
/// minimum; the sender gets every remaining unit back as change.
pub fn assemble_transfer(
    selection: &SelectionResult,
    request: &TransferRequest,
    sender: &str,
    ttl: u64,
) -> RelayResult<UnsignedTransaction> {
    let totals = selection.totals();

    let mut recipient = AssetAmounts::new();
    recipient.insert(LOVELACE.to_string(), request.recipient_min);
    recipient.insert(request.token_unit.clone(), request.token_amount);

    let change = change_amounts(&totals, &recipient, request.fee)?;
    let change_native = change.get(LOVELACE).copied().unwrap_or(0);
    if change_native < request.change_min {
        return Err(RelayError::InvariantViolation(format!(
            "Change of {} lovelace is below the {} minimum",
            change_native, request.change_min
        )));
    }

    let tx = UnsignedTransaction {
        inputs: selection.selected.iter().map(|o| o.output_ref.clone()).collect(),
        outputs: vec![
            TxOutput {
                address: request.recipient.clone(),
                amounts: recipient,
            },
            TxOutput {
                address: sender.to_string(),
                amounts: change,
            },
        ],
        fee: request.fee,
        ttl,
    };

    if !tx.is_balanced(&totals) {
        return Err(RelayError::InvariantViolation(
            "Assembled transaction does not balance".to_string(),
        ));
    }

    Ok(tx)
}

/// Remainder per unit. A negative remainder is an error, not a clamp.
fn change_amounts(
    totals: &BTreeMap<String, u128>,
    recipient: &AssetAmounts,
    fee: u64,
) -> RelayResult<AssetAmounts> {
    let mut change = AssetAmounts::new();

    let mut units: Vec<&String> = totals.keys().collect();
    for unit in recipient.keys() {
        if !totals.contains_key(unit) {
            units.push(unit);
        }
    }

    for unit in units {
        let available = totals.get(unit).copied().unwrap_or(0);
        let mut spent = recipient.get(unit).copied().unwrap_or(0) as u128;
        if unit == LOVELACE {
            spent += fee as u128;
        }

        let remainder = available.checked_sub(spent).ok_or_else(|| {
            RelayError::InvariantViolation(format!(
                "Change for {} would be negative: {} available, {} spent",
                unit, available, spent
            ))
        })?;
        let remainder = u64::try_from(remainder).map_err(|_| {
            RelayError::InvariantViolation(format!("Change for {} exceeds u64", unit))
        })?;

        if remainder > 0 || unit == LOVELACE {
            change.insert(unit.clone(), remainder);
        }
    }

    Ok(change)
}
