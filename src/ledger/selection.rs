//! Greedy largest-first coin selection.
//!
//! # Policy
//! 1. Only outputs holding the target token seed the selection.
//! 2. Token holders are taken by token quantity, largest first, until the
//!    token amount and `recipient_min + fee` are both covered.
//! 3. If change would fall below `change_min`, unselected outputs without
//!    the target token are taken by native quantity, largest first, until
//!    it no longer does. Leftover token holders are never used for this.
//!
//! Both sorts are stable, so equal quantities keep the order the indexer
//! returned them in. The same input always yields the same selection.

use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{SelectionResult, SelectionTarget, SpendableOutput};

/// Select outputs covering `target`, or fail without a partial result.
pub fn select_outputs(
    outputs: &[SpendableOutput],
    target: &SelectionTarget,
) -> RelayResult<SelectionResult> {
    if target.token_amount == 0 {
        return Err(RelayError::InputValidation(
            "Token amount must be positive".to_string(),
        ));
    }

    let unit = target.token_unit.as_str();
    let required_token = target.token_amount as u128;
    let floor = target.native_floor();
    let threshold = target.native_threshold();

    let mut holders: Vec<usize> = (0..outputs.len())
        .filter(|&i| outputs[i].quantity(unit) > 0)
        .collect();
    if holders.is_empty() {
        return Err(RelayError::NoMatchingOutputs(unit.to_string()));
    }
    holders.sort_by(|&a, &b| outputs[b].quantity(unit).cmp(&outputs[a].quantity(unit)));

    let mut picked = vec![false; outputs.len()];
    let mut order = Vec::new();
    let mut native_total = 0u128;
    let mut token_total = 0u128;

    for &i in &holders {
        if token_total >= required_token && native_total >= floor {
            break;
        }
        picked[i] = true;
        order.push(i);
        native_total += outputs[i].native() as u128;
        token_total += outputs[i].quantity(unit) as u128;
    }

    let insufficient = |native: u128, token: u128| RelayError::InsufficientBalance {
        required_native: threshold,
        available_native: native,
        required_token,
        available_token: token,
    };

    if token_total < required_token {
        return Err(insufficient(native_total, token_total));
    }

    if native_total < threshold {
        let mut rest: Vec<usize> = (0..outputs.len())
            .filter(|&i| !picked[i] && outputs[i].quantity(unit) == 0 && outputs[i].native() > 0)
            .collect();
        rest.sort_by(|&a, &b| outputs[b].native().cmp(&outputs[a].native()));

        for i in rest {
            if native_total >= threshold {
                break;
            }
            order.push(i);
            native_total += outputs[i].native() as u128;
        }

        if native_total < threshold {
            return Err(insufficient(native_total, token_total));
        }
    }

    tracing::debug!(
        token_unit = unit,
        inputs = order.len(),
        native_total = %native_total,
        token_total = %token_total,
        "Coin selection complete"
    );

    Ok(SelectionResult {
        selected: order.into_iter().map(|i| outputs[i].clone()).collect(),
        native_total,
        token_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::LOVELACE;
    use crate::ledger::types::{AssetAmounts, OutputRef};

    const TOKEN: &str = "tokenX";

    fn output(tx: &str, native: u64, token: u64) -> SpendableOutput {
        let mut amounts = AssetAmounts::new();
        amounts.insert(LOVELACE.to_string(), native);
        if token > 0 {
            amounts.insert(TOKEN.to_string(), token);
        }
        SpendableOutput {
            output_ref: OutputRef { tx_hash: tx.to_string(), index: 0 },
            address: "addr_sender".to_string(),
            amounts,
            block: None,
        }
    }

    fn target(token_amount: u64) -> SelectionTarget {
        SelectionTarget {
            token_unit: TOKEN.to_string(),
            token_amount,
            fee: 200_000,
            recipient_min: 1_200_000,
            change_min: 1_200_000,
        }
    }

    fn ids(result: &SelectionResult) -> Vec<&str> {
        result.selected.iter().map(|o| o.output_ref.tx_hash.as_str()).collect()
    }

    #[test]
    fn test_no_token_holders() {
        let outputs = vec![output("a", 5_000_000, 0)];
        let err = select_outputs(&outputs, &target(1)).unwrap_err();
        assert!(matches!(err, RelayError::NoMatchingOutputs(ref u) if u == TOKEN));
    }

    #[test]
    fn test_single_output_short_on_native() {
        // One output: 500 X and 2,000,000 native against a 2,600,000 threshold.
        let outputs = vec![output("a", 2_000_000, 500)];
        let err = select_outputs(&outputs, &target(300)).unwrap_err();
        match err {
            RelayError::InsufficientBalance {
                required_native,
                available_native,
                required_token,
                available_token,
            } => {
                assert_eq!(required_native, 2_600_000);
                assert_eq!(available_native, 2_000_000);
                assert_eq!(required_token, 300);
                assert_eq!(available_token, 500);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_token_shortfall() {
        let outputs = vec![output("a", 9_000_000, 100), output("b", 9_000_000, 50)];
        let err = select_outputs(&outputs, &target(300)).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InsufficientBalance { required_token: 300, available_token: 150, .. }
        ));
    }

    #[test]
    fn test_largest_token_holder_first() {
        let outputs = vec![
            output("small", 3_000_000, 10),
            output("large", 3_000_000, 400),
            output("mid", 3_000_000, 100),
        ];
        let result = select_outputs(&outputs, &target(300)).unwrap();
        assert_eq!(ids(&result), vec!["large"]);
        assert_eq!(result.token_total, 400);
    }

    #[test]
    fn test_tops_up_native_from_remaining_pool() {
        let outputs = vec![
            output("tok", 2_000_000, 500),
            output("dust", 100_000, 0),
            output("big", 5_000_000, 0),
        ];
        let result = select_outputs(&outputs, &target(300)).unwrap();
        assert_eq!(ids(&result), vec!["tok", "big"]);
        assert_eq!(result.native_total, 7_000_000);
    }

    #[test]
    fn test_top_up_skips_leftover_token_holders() {
        let outputs = vec![
            output("a", 1_500_000, 300),
            output("tokdust", 5_000_000, 1),
            output("plain", 2_000_000, 0),
        ];
        let result = select_outputs(&outputs, &target(300)).unwrap();
        assert_eq!(ids(&result), vec!["a", "plain"]);
        assert_eq!(result.token_total, 300);
        assert_eq!(result.native_total, 3_500_000);
    }

    #[test]
    fn test_only_token_holders_left_for_top_up() {
        let outputs = vec![output("a", 1_500_000, 300), output("b", 5_000_000, 1)];
        let err = select_outputs(&outputs, &target(300)).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InsufficientBalance { available_native: 1_500_000, available_token: 300, .. }
        ));
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let outputs = vec![
            output("first", 3_000_000, 300),
            output("second", 3_000_000, 300),
        ];
        let result = select_outputs(&outputs, &target(300)).unwrap();
        assert_eq!(ids(&result), vec!["first"]);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let outputs = vec![
            output("a", 1_000_000, 100),
            output("b", 800_000, 100),
            output("c", 4_000_000, 0),
            output("d", 4_000_000, 0),
            output("e", 900_000, 250),
        ];
        let first = select_outputs(&outputs, &target(320)).unwrap();
        for _ in 0..10 {
            assert_eq!(select_outputs(&outputs, &target(320)).unwrap(), first);
        }
        assert_eq!(ids(&first), vec!["e", "a", "c"]);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let outputs = vec![output("a", 9_000_000, 5)];
        assert!(matches!(
            select_outputs(&outputs, &target(0)),
            Err(RelayError::InputValidation(_))
        ));
    }
}
