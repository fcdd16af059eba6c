//! Per-chain claim message encodings.
//!
//! Every supported chain has exactly one encoding, chosen by an exhaustive
//! match on [`Chain`]. Adding a chain without deciding its encoding does not
//! compile.

use bitcoin::hashes::Hash;
use sha2::{Digest, Sha512};

use crate::blockchain::{cardano_derivation_path, Chain};
use crate::codec::{bech32_address_bytes, CoseMessage};
use crate::error::{RelayError, RelayResult};
use crate::signing::types::{MessageKind, SigningOperation, SigningRequest, UnsignedMessage};

/// `STX\0`, the XRP Ledger single-signing hash prefix.
const XRP_SIGNING_PREFIX: [u8; 4] = [0x53, 0x54, 0x58, 0x00];

/// A claim message encoded for one chain's signing convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimPayload {
    /// CIP-8 `Sig_structure`, signed raw with the account's payment key.
    Cip8 { signing_data: Vec<u8>, derivation_path: Vec<u32> },
    /// BIP-137 message digest.
    Bip137 { digest: [u8; 32] },
    /// EIP-191 personal message; the custody service applies the prefix.
    Eip191 { message: Vec<u8> },
    /// Message bytes signed as-is.
    Plain { message: Vec<u8> },
    /// XRP Ledger signing hash of the message.
    XrpSigningHash { hash: [u8; 32] },
}

impl ClaimPayload {
    /// Encode `message` for `chain`. `address` is the session's address,
    /// which CIP-8 binds into the protected header.
    pub fn encode(chain: Chain, account: &str, address: &str, message: &str) -> RelayResult<Self> {
        let bytes = message.as_bytes();
        match chain {
            Chain::Cardano => {
                let address_bytes = bech32_address_bytes(address)?;
                Ok(ClaimPayload::Cip8 {
                    signing_data: CoseMessage::new(&address_bytes, bytes).signing_data(),
                    derivation_path: cardano_derivation_path(account)?,
                })
            }
            Chain::Bitcoin => Ok(ClaimPayload::Bip137 { digest: bitcoin_message_digest(message) }),
            Chain::Ethereum | Chain::Bnb | Chain::Avalanche => {
                Ok(ClaimPayload::Eip191 { message: bytes.to_vec() })
            }
            Chain::Solana => Ok(ClaimPayload::Plain { message: bytes.to_vec() }),
            Chain::Xrp => Ok(ClaimPayload::XrpSigningHash { hash: xrp_signing_hash(bytes) }),
            Chain::Bat => Err(RelayError::InputValidation(format!(
                "Claim signing is not supported on {}",
                chain
            ))),
        }
    }

    /// Encode and wrap into a signing request for `account`.
    pub fn build(chain: Chain, account: &str, address: &str, message: &str) -> RelayResult<SigningRequest> {
        let payload = Self::encode(chain, account, address, message)?;
        Ok(payload.into_request(chain, account))
    }

    pub fn operation(&self) -> SigningOperation {
        match self {
            ClaimPayload::Eip191 { .. } => SigningOperation::TypedMessage,
            _ => SigningOperation::Raw,
        }
    }

    pub fn into_request(self, chain: Chain, account: &str) -> SigningRequest {
        let operation = self.operation();
        let message = match self {
            ClaimPayload::Cip8 { signing_data, derivation_path } => UnsignedMessage {
                content: hex::encode(signing_data),
                derivation_path: Some(derivation_path),
                kind: None,
            },
            ClaimPayload::Bip137 { digest } => UnsignedMessage {
                content: hex::encode(digest),
                derivation_path: None,
                kind: None,
            },
            ClaimPayload::Eip191 { message } => UnsignedMessage {
                content: hex::encode(message),
                derivation_path: None,
                kind: Some(MessageKind::EthPersonal),
            },
            ClaimPayload::Plain { message } => UnsignedMessage {
                content: hex::encode(message),
                derivation_path: None,
                kind: None,
            },
            ClaimPayload::XrpSigningHash { hash } => UnsignedMessage {
                content: hex::encode(hash),
                derivation_path: None,
                kind: None,
            },
        };
        SigningRequest::new(chain, account, operation, message, format!("{} claim", chain))
    }
}

/// Double SHA-256 of the message behind the "Bitcoin Signed Message" prefix.
pub fn bitcoin_message_digest(message: &str) -> [u8; 32] {
    bitcoin::sign_message::signed_msg_hash(message).to_byte_array()
}

/// First half of `SHA512(STX\0 ‖ message)`.
pub fn xrp_signing_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    hasher.update(XRP_SIGNING_PREFIX);
    hasher.update(message);
    let full = hasher.finalize();
    let mut half = [0u8; 32];
    half.copy_from_slice(&full[..32]);
    half
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{ToBase32, Variant};
    use sha2::Sha256;

    const MESSAGE: &str = "STAR 100 to addr1dest abcd";

    fn cardano_address() -> String {
        let mut raw = vec![0x61];
        raw.extend_from_slice(&[9u8; 28]);
        bech32::encode("addr", raw.to_base32(), Variant::Bech32).unwrap()
    }

    #[test]
    fn test_cardano_uses_cip8_and_derivation_path() {
        let req = ClaimPayload::build(Chain::Cardano, "12", &cardano_address(), MESSAGE).unwrap();
        assert_eq!(req.operation, SigningOperation::Raw);
        assert_eq!(req.asset_id, "ADA");
        let msg = &req.messages[0];
        assert_eq!(msg.derivation_path.as_deref(), Some(&[44, 1815, 12, 0, 0][..]));
        // Sig_structure starts with array(4) "Signature1"
        assert!(msg.content.starts_with("846a5369676e617475726531"));
        assert!(msg.content.ends_with(&hex::encode(MESSAGE)));
    }

    #[test]
    fn test_cardano_requires_numeric_account() {
        let err = ClaimPayload::build(Chain::Cardano, "vault-x", &cardano_address(), MESSAGE);
        assert!(matches!(err, Err(RelayError::InputValidation(_))));
    }

    #[test]
    fn test_evm_chains_use_typed_message() {
        for chain in [Chain::Ethereum, Chain::Bnb, Chain::Avalanche] {
            let req = ClaimPayload::build(chain, "1", "0xabc", MESSAGE).unwrap();
            assert_eq!(req.operation, SigningOperation::TypedMessage);
            assert_eq!(req.messages[0].kind, Some(MessageKind::EthPersonal));
            assert_eq!(req.messages[0].content, hex::encode(MESSAGE));
        }
    }

    #[test]
    fn test_bitcoin_digest() {
        let req = ClaimPayload::build(Chain::Bitcoin, "1", "bc1q", "hello").unwrap();
        assert_eq!(req.operation, SigningOperation::Raw);

        let mut expected = b"\x18Bitcoin Signed Message:\n\x05hello".to_vec();
        expected = Sha256::digest(Sha256::digest(&expected)).to_vec();
        assert_eq!(req.messages[0].content, hex::encode(expected));
    }

    #[test]
    fn test_bitcoin_digest_long_message() {
        // 300 bytes needs the three-byte length prefix
        let message = "a".repeat(300);
        let mut expected = b"\x18Bitcoin Signed Message:\n\xfd\x2c\x01".to_vec();
        expected.extend_from_slice(message.as_bytes());
        let expected: [u8; 32] = Sha256::digest(Sha256::digest(&expected)).into();
        assert_eq!(bitcoin_message_digest(&message), expected);
    }

    #[test]
    fn test_solana_plain_hex() {
        let req = ClaimPayload::build(Chain::Solana, "1", "So1", MESSAGE).unwrap();
        assert_eq!(req.operation, SigningOperation::Raw);
        assert_eq!(req.messages[0].content, hex::encode(MESSAGE));
    }

    #[test]
    fn test_xrp_signing_hash() {
        let req = ClaimPayload::build(Chain::Xrp, "1", "r1", "x").unwrap();
        let full = Sha512::digest([0x53, 0x54, 0x58, 0x00, b'x']);
        assert_eq!(req.messages[0].content, hex::encode(&full[..32]));
    }

    #[test]
    fn test_bat_is_unsupported() {
        let err = ClaimPayload::build(Chain::Bat, "1", "0xabc", MESSAGE).unwrap_err();
        assert!(matches!(err, RelayError::InputValidation(_)));
    }
}
