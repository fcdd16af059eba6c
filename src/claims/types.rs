//! Claim API payloads and workflow results.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A claimable allocation for an address.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Allocation {
    /// Amount as reported by the API, kept verbatim for the claim message.
    pub value: Number,
}

impl Allocation {
    pub fn is_positive(&self) -> bool {
        self.value.as_f64().map(|v| v > 0.0).unwrap_or(false)
    }
}

/// An existing claim, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ClaimRecord(pub Value);

/// What the claim API returns for an accepted claim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ClaimReceipt(pub Value);

/// Body of `POST /claims/{chain}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmission {
    pub address: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(rename = "cose_sign1", skip_serializing_if = "Option::is_none")]
    pub cose_sign1: Option<String>,
    #[serde(rename = "cose_key", skip_serializing_if = "Option::is_none")]
    pub cose_key: Option<String>,
    pub destination_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Result of running the claim workflow for one account.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// No positive allocation.
    Unclaimable,
    /// Claims already exist for the address.
    AlreadyClaimed { claims: usize },
    /// The claim was submitted and accepted.
    Claimed { amount: String, receipt: ClaimReceipt },
}

impl ClaimOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ClaimOutcome::Unclaimable => "unclaimable",
            ClaimOutcome::AlreadyClaimed { .. } => "already_claimed",
            ClaimOutcome::Claimed { .. } => "claimed",
        }
    }
}

/// The message the claimant signs.
pub fn claim_message(amount: &str, destination: &str, terms_hash: &str) -> String {
    format!("STAR {} to {} {}", amount, destination, terms_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_message() {
        assert_eq!(claim_message("1250", "addr1dest", "ab12"), "STAR 1250 to addr1dest ab12");
    }

    #[test]
    fn test_allocation_sign() {
        let a: Allocation = serde_json::from_str(r#"{"value": 12.5}"#).unwrap();
        assert!(a.is_positive());
        assert_eq!(a.value.to_string(), "12.5");
        let zero: Allocation = serde_json::from_str(r#"{"value": 0}"#).unwrap();
        assert!(!zero.is_positive());
    }

    #[test]
    fn test_submission_wire_names() {
        let submission = ClaimSubmission {
            address: "addr1".into(),
            amount: "10".into(),
            signature: None,
            cose_sign1: Some("84".into()),
            cose_key: Some("a4".into()),
            destination_address: "addr1dest".into(),
            public_key: None,
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["cose_sign1"], "84");
        assert_eq!(json["destinationAddress"], "addr1dest");
        assert!(json.get("signature").is_none());
        assert!(json.get("publicKey").is_none());
    }
}
