//! Signature recombination per chain.
//!
//! | chain              | output                          |
//! |--------------------|---------------------------------|
//! | bitcoin            | `base64([v + 31] ‖ fullSig)`    |
//! | ethereum, bnb, avax| `0x ‖ r ‖ s ‖ hex(v + 27)`      |
//! | cardano, solana, xrp | `fullSig` unchanged           |

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::blockchain::Chain;
use crate::error::{RelayError, RelayResult};
use crate::signing::types::SignatureShape;

/// BIP-137 header for compressed P2PKH keys.
const BITCOIN_RECOVERY_OFFSET: u8 = 31;
/// Ethereum `v` offset for legacy personal signatures.
const EVM_RECOVERY_OFFSET: u8 = 27;

/// Recombine a custody signature into the form `chain` expects.
pub fn decode_signature(chain: Chain, signature: &SignatureShape) -> RelayResult<String> {
    match chain {
        Chain::Bitcoin => {
            let header = recovery_byte(signature.v, BITCOIN_RECOVERY_OFFSET)?;
            let full = hex::decode(strip_0x(&signature.full_sig)).map_err(|e| {
                RelayError::MalformedSignerResponse(format!("fullSig is not hex: {}", e))
            })?;
            let mut bytes = Vec::with_capacity(1 + full.len());
            bytes.push(header);
            bytes.extend_from_slice(&full);
            Ok(BASE64.encode(bytes))
        }
        Chain::Ethereum | Chain::Bnb | Chain::Avalanche => {
            let r = component(&signature.r, "r")?;
            let s = component(&signature.s, "s")?;
            let v = recovery_byte(signature.v, EVM_RECOVERY_OFFSET)?;
            Ok(format!("0x{}{}{:02x}", r, s, v))
        }
        Chain::Cardano | Chain::Solana | Chain::Xrp => Ok(signature.full_sig.clone()),
        Chain::Bat => Err(RelayError::InputValidation(format!(
            "Signature decoding is not defined for {}",
            chain
        ))),
    }
}

fn recovery_byte(v: Option<u8>, offset: u8) -> RelayResult<u8> {
    let v = v.ok_or_else(|| {
        RelayError::MalformedSignerResponse("ECDSA signature is missing v".to_string())
    })?;
    v.checked_add(offset).ok_or_else(|| {
        RelayError::MalformedSignerResponse(format!("Recovery id {} out of range", v))
    })
}

fn component<'a>(value: &'a Option<String>, name: &str) -> RelayResult<&'a str> {
    match value.as_deref().map(strip_0x) {
        Some(v) if v.len() == 64 && v.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(v),
        Some(v) => Err(RelayError::MalformedSignerResponse(format!(
            "ECDSA {} must be 32 bytes of hex, got '{}'",
            name, v
        ))),
        None => Err(RelayError::MalformedSignerResponse(format!(
            "ECDSA signature is missing {}",
            name
        ))),
    }
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}
