//! Signing request and result types.

use serde::{Deserialize, Serialize};

use crate::blockchain::{Chain, SigningAlgorithm};

/// How the custody service should treat the message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningOperation {
    /// Sign the content bytes as given.
    #[serde(rename = "RAW")]
    Raw,
    /// Apply the message standard named by [`MessageKind`] before signing.
    #[serde(rename = "TYPED_MESSAGE")]
    TypedMessage,
}

/// Message standard for typed-message requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// EIP-191 `personal_sign`.
    #[serde(rename = "ETH_MESSAGE")]
    EthPersonal,
}

/// One message to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedMessage {
    /// Hex-encoded content.
    pub content: String,
    pub derivation_path: Option<Vec<u32>>,
    pub kind: Option<MessageKind>,
}

/// A request for the custody service to sign on behalf of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub chain: Chain,
    pub asset_id: String,
    pub account_id: String,
    pub operation: SigningOperation,
    pub messages: Vec<UnsignedMessage>,
    pub note: String,
    /// Idempotency key sent to the custody service.
    pub external_id: String,
}

impl SigningRequest {
    pub fn new(
        chain: Chain,
        account_id: &str,
        operation: SigningOperation,
        message: UnsignedMessage,
        note: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            asset_id: chain.asset_id().to_string(),
            account_id: account_id.to_string(),
            operation,
            messages: vec![message],
            note: note.into(),
            external_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Signature as returned by the custody service. ECDSA results carry the
/// separate components, EdDSA results only `full_sig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureShape {
    pub full_sig: String,
    #[serde(default)]
    pub r: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub v: Option<u8>,
}

/// A completed signature for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResult {
    pub signature: SignatureShape,
    /// Hex-encoded public key.
    pub public_key: String,
    pub algorithm: SigningAlgorithm,
    /// Content that was signed, echoed back by the service.
    pub content: String,
}

/// Remote request status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Completed,
    Broadcasting,
    Blocked,
    Cancelled,
    Failed,
    Rejected,
    /// Any non-terminal status (submitted, pending signature, ...).
    Pending(String),
}

impl RequestStatus {
    /// Case-insensitive parse of the wire value.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => RequestStatus::Completed,
            "BROADCASTING" => RequestStatus::Broadcasting,
            "BLOCKED" => RequestStatus::Blocked,
            "CANCELLED" => RequestStatus::Cancelled,
            "FAILED" => RequestStatus::Failed,
            "REJECTED" => RequestStatus::Rejected,
            other => RequestStatus::Pending(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Broadcasting => "BROADCASTING",
            RequestStatus::Blocked => "BLOCKED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Failed => "FAILED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Pending(raw) => raw,
        }
    }

    /// The signature is available.
    pub fn is_success(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Broadcasting)
    }

    /// The request will never produce a signature.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RequestStatus::Blocked
                | RequestStatus::Cancelled
                | RequestStatus::Failed
                | RequestStatus::Rejected
        )
    }
}

/// One signed message inside a status response. Every field is optional on
/// the wire; the driver checks presence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedMessage {
    pub content: String,
    pub signature: Option<SignatureShape>,
    pub public_key: Option<String>,
    pub algorithm: Option<SigningAlgorithm>,
}

/// Answer to a submission. The id may be missing on a broken response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// Answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: RequestStatus,
    pub sub_status: String,
    pub signed_messages: Vec<SignedMessage>,
}
