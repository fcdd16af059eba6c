//! Transaction serialization boundary and the Cardano body encoder.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use std::collections::BTreeMap;

use crate::blockchain::types::LOVELACE;
use crate::codec::{bech32_address_bytes, CborWriter};
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::{AssetAmounts, SerializedBody, UnsignedTransaction, Witness};

/// Hex length of a minting policy id.
const POLICY_ID_HEX_LEN: usize = 56;

/// Turns an unsigned transaction into bytes and a signing hash, and later
/// attaches witnesses to produce the broadcastable serialization.
pub trait TransactionSerializer: Send + Sync {
    fn serialize_body(&self, tx: &UnsignedTransaction) -> RelayResult<SerializedBody>;

    fn finalize(&self, body: &SerializedBody, witnesses: &[Witness]) -> RelayResult<Vec<u8>>;
}

/// Shelley/Mary-era body: `{0: inputs, 1: outputs, 2: fee, 3: ttl}`,
/// hashed with Blake2b-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct CardanoSerializer;

impl CardanoSerializer {
    fn encode_value(w: &mut CborWriter, amounts: &AssetAmounts) -> RelayResult<()> {
        let coin = amounts.get(LOVELACE).copied().unwrap_or(0);

        let mut policies: BTreeMap<Vec<u8>, Vec<(Vec<u8>, u64)>> = BTreeMap::new();
        for (unit, qty) in amounts {
            if unit == LOVELACE || *qty == 0 {
                continue;
            }
            let (policy, name) = split_unit(unit)?;
            policies.entry(policy).or_default().push((name, *qty));
        }

        if policies.is_empty() {
            w.unsigned(coin);
            return Ok(());
        }

        w.array(2).unsigned(coin).map(policies.len());
        for (policy, mut assets) in policies {
            // canonical CBOR: shorter keys first, then bytewise
            assets.sort_by(|a, b| (a.0.len(), &a.0).cmp(&(b.0.len(), &b.0)));
            w.bytes(&policy).map(assets.len());
            for (name, qty) in assets {
                w.bytes(&name).unsigned(qty);
            }
        }
        Ok(())
    }
}

impl TransactionSerializer for CardanoSerializer {
    fn serialize_body(&self, tx: &UnsignedTransaction) -> RelayResult<SerializedBody> {
        let mut w = CborWriter::new();
        w.map(4);

        w.unsigned(0).array(tx.inputs.len());
        for input in &tx.inputs {
            let hash = hex::decode(&input.tx_hash).map_err(|e| {
                RelayError::SerializationFailure(format!(
                    "Input tx hash '{}' is not hex: {}",
                    input.tx_hash, e
                ))
            })?;
            w.array(2).bytes(&hash).unsigned(input.index as u64);
        }

        w.unsigned(1).array(tx.outputs.len());
        for output in &tx.outputs {
            let address = bech32_address_bytes(&output.address).map_err(|e| {
                RelayError::SerializationFailure(format!("Output address: {}", e))
            })?;
            w.array(2).bytes(&address);
            Self::encode_value(&mut w, &output.amounts)?;
        }

        w.unsigned(2).unsigned(tx.fee);
        w.unsigned(3).unsigned(tx.ttl);

        let bytes = w.into_bytes();
        let signing_hash = blake2b_256(&bytes);
        Ok(SerializedBody { bytes, signing_hash })
    }

    fn finalize(&self, body: &SerializedBody, witnesses: &[Witness]) -> RelayResult<Vec<u8>> {
        if witnesses.is_empty() {
            return Err(RelayError::SerializationFailure(
                "At least one witness is required".to_string(),
            ));
        }
        for witness in witnesses {
            if witness.public_key.len() != 32 || witness.signature.len() != 64 {
                return Err(RelayError::SerializationFailure(format!(
                    "Ed25519 witness must be 32-byte key and 64-byte signature, got {} and {}",
                    witness.public_key.len(),
                    witness.signature.len()
                )));
            }
        }

        let mut w = CborWriter::new();
        w.array(4).raw(&body.bytes);
        w.map(1).unsigned(0).array(witnesses.len());
        for witness in witnesses {
            w.array(2).bytes(&witness.public_key).bytes(&witness.signature);
        }
        w.bool(true).null();
        Ok(w.into_bytes())
    }
}

/// Blake2b with a 256-bit digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn split_unit(unit: &str) -> RelayResult<(Vec<u8>, Vec<u8>)> {
    if unit.len() < POLICY_ID_HEX_LEN {
        return Err(RelayError::SerializationFailure(format!(
            "Asset unit '{}' is shorter than a policy id",
            unit
        )));
    }
    let (policy, name) = unit.split_at(POLICY_ID_HEX_LEN);
    let decode = |part: &str| {
        hex::decode(part).map_err(|e| {
            RelayError::SerializationFailure(format!("Asset unit '{}' is not hex: {}", unit, e))
        })
    };
    Ok((decode(policy)?, decode(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{OutputRef, TxOutput};
    use bech32::{ToBase32, Variant};

    fn address(fill: u8) -> String {
        let mut raw = vec![0x61];
        raw.extend_from_slice(&[fill; 28]);
        bech32::encode("addr_test", raw.to_base32(), Variant::Bech32).unwrap()
    }

    fn token_unit() -> String {
        format!("{}{}", "ab".repeat(28), hex::encode("NIGHT"))
    }

    fn sample_tx() -> UnsignedTransaction {
        let mut recipient = AssetAmounts::new();
        recipient.insert(LOVELACE.into(), 1_200_000);
        recipient.insert(token_unit(), 300);
        let mut change = AssetAmounts::new();
        change.insert(LOVELACE.into(), 1_400_000);

        UnsignedTransaction {
            inputs: vec![OutputRef { tx_hash: "11".repeat(32), index: 0 }],
            outputs: vec![
                TxOutput { address: address(1), amounts: recipient },
                TxOutput { address: address(2), amounts: change },
            ],
            fee: 200_000,
            ttl: 2_600,
        }
    }

    #[test]
    fn test_blake2b_256_vector() {
        // Blake2b-256("abc")
        assert_eq!(
            hex::encode(blake2b_256(b"abc")),
            "bddd813c634239723171ef3fee98579b94964e3bb1cb3e427262c8c068d52319"
        );
    }

    #[test]
    fn test_body_layout_and_hash() {
        let body = CardanoSerializer.serialize_body(&sample_tx()).unwrap();

        // map(4), key 0, array(1), array(2), bytes(32)
        assert_eq!(&body.bytes[..5], &[0xa4, 0x00, 0x81, 0x82, 0x58]);
        assert_eq!(body.signing_hash, blake2b_256(&body.bytes));
        assert_eq!(body.tx_hash().len(), 64);

        // fee and ttl trail the body
        assert!(body.bytes.ends_with(&[0x02, 0x1a, 0x00, 0x03, 0x0d, 0x40, 0x03, 0x19, 0x0a, 0x28]));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = CardanoSerializer.serialize_body(&sample_tx()).unwrap();
        let b = CardanoSerializer.serialize_body(&sample_tx()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_finalize_wraps_witness() {
        let body = CardanoSerializer.serialize_body(&sample_tx()).unwrap();
        let witness = Witness { public_key: vec![3; 32], signature: vec![4; 64] };
        let signed = CardanoSerializer.finalize(&body, &[witness]).unwrap();

        assert_eq!(signed[0], 0x84);
        assert_eq!(&signed[1..1 + body.bytes.len()], body.bytes.as_slice());
        assert!(signed.ends_with(&[0xf5, 0xf6]));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let mut tx = sample_tx();
        tx.inputs[0].tx_hash = "zz".into();
        assert!(matches!(
            CardanoSerializer.serialize_body(&tx),
            Err(RelayError::SerializationFailure(_))
        ));

        let body = CardanoSerializer.serialize_body(&sample_tx()).unwrap();
        assert!(CardanoSerializer.finalize(&body, &[]).is_err());
        let short = Witness { public_key: vec![0; 33], signature: vec![0; 64] };
        assert!(CardanoSerializer.finalize(&body, &[short]).is_err());
    }
}
