//! Address decoding for payloads that embed raw address bytes.

use bech32::FromBase32;

use crate::error::{RelayError, RelayResult};

/// Decode a bech32 address (e.g. `addr1...`) into its raw bytes.
pub fn bech32_address_bytes(address: &str) -> RelayResult<Vec<u8>> {
    let (_hrp, data, _variant) = bech32::decode(address).map_err(|e| {
        RelayError::InputValidation(format!("Invalid bech32 address '{}': {}", address, e))
    })?;

    Vec::<u8>::from_base32(&data).map_err(|e| {
        RelayError::InputValidation(format!("Invalid bech32 payload in '{}': {}", address, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{ToBase32, Variant};

    #[test]
    fn test_decodes_enterprise_address() {
        let mut raw = vec![0x61];
        raw.extend_from_slice(&[0x11; 28]);
        let encoded = bech32::encode("addr", raw.to_base32(), Variant::Bech32).unwrap();

        assert_eq!(bech32_address_bytes(&encoded).unwrap(), raw);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = bech32_address_bytes("not-an-address").unwrap_err();
        assert!(matches!(err, RelayError::InputValidation(_)));
    }
}
