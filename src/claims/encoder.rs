//! Turns a completed claim signature into the submission body.

use alloy::primitives::{Address, Signature};

use crate::blockchain::Chain;
use crate::claims::types::ClaimSubmission;
use crate::codec::{bech32_address_bytes, ed25519_cose_key, CoseMessage};
use crate::error::{RelayError, RelayResult};
use crate::signing::{decode_signature, SigningResult};

/// Build the claim body for `chain` from the signer's result.
///
/// Cardano claims carry a `COSE_Sign1` and `COSE_Key`. EVM signatures are
/// checked by recovering the signer address from the message before they
/// leave the process.
pub fn build_submission(
    chain: Chain,
    address: &str,
    amount: &str,
    destination: &str,
    message: &str,
    signed: &SigningResult,
) -> RelayResult<ClaimSubmission> {
    let mut submission = ClaimSubmission {
        address: address.to_string(),
        amount: amount.to_string(),
        signature: None,
        cose_sign1: None,
        cose_key: None,
        destination_address: destination.to_string(),
        public_key: None,
    };

    match chain {
        Chain::Cardano => {
            let signature = hex_field("fullSig", &signed.signature.full_sig)?;
            let public_key = hex_field("publicKey", &signed.public_key)?;
            let cose = CoseMessage::new(&bech32_address_bytes(address)?, message.as_bytes());
            submission.cose_sign1 = Some(hex::encode(cose.sign1(&signature)));
            submission.cose_key = Some(hex::encode(ed25519_cose_key(&public_key)));
        }
        Chain::Ethereum | Chain::Bnb | Chain::Avalanche => {
            let signature = decode_signature(chain, &signed.signature)?;
            verify_evm_signer(&signature, address, message)?;
            submission.signature = Some(signature);
        }
        Chain::Bitcoin | Chain::Solana | Chain::Xrp => {
            submission.signature = Some(decode_signature(chain, &signed.signature)?);
            submission.public_key = Some(signed.public_key.clone());
        }
        Chain::Bat => {
            return Err(RelayError::InputValidation(format!(
                "Claim submission is not supported on {}",
                chain
            )))
        }
    }

    Ok(submission)
}

/// Check that `signature` over the EIP-191 `message` recovers to `address`.
pub fn verify_evm_signer(signature: &str, address: &str, message: &str) -> RelayResult<()> {
    let expected: Address = address.parse().map_err(|e| {
        RelayError::InputValidation(format!("Session address '{}' is not an EVM address: {}", address, e))
    })?;

    let bytes = hex_field("signature", signature.trim_start_matches("0x"))?;
    let parsed = Signature::try_from(bytes.as_slice()).map_err(|e| {
        RelayError::MalformedSignerResponse(format!("Unparseable EVM signature: {}", e))
    })?;
    let recovered = parsed.recover_address_from_msg(message.as_bytes()).map_err(|e| {
        RelayError::MalformedSignerResponse(format!("Signature recovery failed: {}", e))
    })?;

    if recovered != expected {
        return Err(RelayError::MalformedSignerResponse(format!(
            "Signature recovers to {} but the session address is {}",
            recovered, expected
        )));
    }
    Ok(())
}

fn hex_field(name: &str, value: &str) -> RelayResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| RelayError::MalformedSignerResponse(format!("{} is not hex: {}", name, e)))
}
