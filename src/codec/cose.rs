//! CIP-8 message signing structures (COSE_Sign1 over Ed25519).
//!
//! The custody service signs the `Sig_structure` bytes; the signature is
//! then wrapped back into a `COSE_Sign1` and shipped together with a
//! `COSE_Key` carrying the public key.

use crate::codec::cbor::CborWriter;

/// COSE algorithm id for EdDSA.
const ALG_EDDSA: i64 = -8;
/// COSE key type for octet key pairs.
const KTY_OKP: i64 = 1;
/// COSE curve id for Ed25519.
const CRV_ED25519: i64 = 6;

/// A CIP-8 message bound to a signing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoseMessage {
    protected: Vec<u8>,
    payload: Vec<u8>,
}

impl CoseMessage {
    /// Build the protected header `{1: -8, "address": <address bytes>}`.
    pub fn new(address_bytes: &[u8], payload: &[u8]) -> Self {
        let mut headers = CborWriter::new();
        headers.map(2).int(1).int(ALG_EDDSA).text("address").bytes(address_bytes);

        Self {
            protected: headers.into_bytes(),
            payload: payload.to_vec(),
        }
    }

    /// Serialized protected header map.
    pub fn protected_header(&self) -> &[u8] {
        &self.protected
    }

    /// `Sig_structure = ["Signature1", protected, external_aad, payload]`.
    pub fn signing_data(&self) -> Vec<u8> {
        let mut w = CborWriter::new();
        w.array(4)
            .text("Signature1")
            .bytes(&self.protected)
            .bytes(&[])
            .bytes(&self.payload);
        w.into_bytes()
    }

    /// `COSE_Sign1 = [protected, {"hashed": false}, payload, signature]`.
    ///
    /// An empty `signature` yields the unsigned envelope.
    pub fn sign1(&self, signature: &[u8]) -> Vec<u8> {
        let mut w = CborWriter::new();
        w.array(4)
            .bytes(&self.protected)
            .map(1)
            .text("hashed")
            .bool(false)
            .bytes(&self.payload)
            .bytes(signature);
        w.into_bytes()
    }
}

/// `COSE_Key = {1: 1, 3: -8, -1: 6, -2: <public key>}`.
pub fn ed25519_cose_key(public_key: &[u8]) -> Vec<u8> {
    let mut w = CborWriter::new();
    w.map(4)
        .int(1)
        .int(KTY_OKP)
        .int(3)
        .int(ALG_EDDSA)
        .int(-1)
        .int(CRV_ED25519)
        .int(-2)
        .bytes(public_key);
    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_data_layout() {
        let msg = CoseMessage::new(&[0x61, 0x01], b"hi");
        let data = msg.signing_data();

        // array(4), text(10) "Signature1"
        assert_eq!(data[0], 0x84);
        assert_eq!(data[1], 0x6a);
        assert_eq!(&data[2..12], b"Signature1");
        // protected header is carried as a byte string
        assert_eq!(data[12], 0x40 | msg.protected_header().len() as u8);
        assert!(data.ends_with(&[0x40, 0x42, b'h', b'i']));
    }

    #[test]
    fn test_protected_header() {
        let msg = CoseMessage::new(&[0xaa], b"");
        assert_eq!(
            hex::encode(msg.protected_header()),
            "a20127676164647265737341aa"
        );
    }

    #[test]
    fn test_sign1_embeds_signature() {
        let msg = CoseMessage::new(&[0x01], b"x");
        let sig = [7u8; 64];
        let envelope = msg.sign1(&sig);
        assert_eq!(envelope[0], 0x84);
        assert!(envelope.ends_with(&sig));
        assert_ne!(envelope, msg.sign1(&[]));
    }

    #[test]
    fn test_cose_key() {
        let key = ed25519_cose_key(&[1u8; 32]);
        assert_eq!(hex::encode(&key[..9]), "a40101032720062158");
        assert_eq!(key.len(), 9 + 1 + 32);
    }
}
