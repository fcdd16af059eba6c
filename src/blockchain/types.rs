//! Chain identifiers and chain-level constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RelayError, RelayResult};

/// Asset unit of the native Cardano currency in indexer listings.
pub const LOVELACE: &str = "lovelace";

/// Cardano BIP-44 coin type.
const CARDANO_COIN_TYPE: u32 = 1815;

/// Signing algorithm used by the custody service for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    #[serde(rename = "MPC_ECDSA_SECP256K1")]
    EcdsaSecp256k1,
    #[serde(rename = "MPC_EDDSA_ED25519")]
    EddsaEd25519,
}

/// Blockchains this relay can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Cardano,
    Bitcoin,
    Ethereum,
    Bnb,
    Avalanche,
    Solana,
    Xrp,
    Bat,
}

impl Chain {
    /// Every chain, in declaration order.
    pub const ALL: [Chain; 8] = [
        Chain::Cardano,
        Chain::Bitcoin,
        Chain::Ethereum,
        Chain::Bnb,
        Chain::Avalanche,
        Chain::Solana,
        Chain::Xrp,
        Chain::Bat,
    ];

    /// Lowercase chain name used in URLs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Cardano => "cardano",
            Chain::Bitcoin => "bitcoin",
            Chain::Ethereum => "ethereum",
            Chain::Bnb => "bnb",
            Chain::Avalanche => "avalanche",
            Chain::Solana => "solana",
            Chain::Xrp => "xrp",
            Chain::Bat => "bat",
        }
    }

    /// Asset identifier the custody service uses for the chain's native asset.
    pub fn asset_id(&self) -> &'static str {
        match self {
            Chain::Cardano => "ADA",
            Chain::Bitcoin => "BTC",
            Chain::Ethereum => "ETH",
            Chain::Bnb => "BNB_BSC",
            Chain::Avalanche => "AVAX",
            Chain::Solana => "SOL",
            Chain::Xrp => "XRP",
            Chain::Bat => "BAT",
        }
    }

    /// Map a custody asset id (e.g. `ADA_TEST`, `BNB_BSC`) to a chain.
    pub fn from_asset_id(asset_id: &str) -> RelayResult<Self> {
        let cleaned = asset_id.trim().replace("_TEST", "");
        let symbol = cleaned.split('_').next().unwrap_or_default();
        match symbol {
            "ADA" => Ok(Chain::Cardano),
            "BTC" => Ok(Chain::Bitcoin),
            "ETH" => Ok(Chain::Ethereum),
            "BNB" => Ok(Chain::Bnb),
            "AVAX" => Ok(Chain::Avalanche),
            "SOL" => Ok(Chain::Solana),
            "XRP" => Ok(Chain::Xrp),
            "BAT" => Ok(Chain::Bat),
            _ => Err(RelayError::InputValidation(format!(
                "Unsupported asset id '{}'",
                asset_id
            ))),
        }
    }

    /// Algorithm the custody service signs with on this chain.
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self {
            Chain::Cardano | Chain::Solana => SigningAlgorithm::EddsaEd25519,
            Chain::Bitcoin
            | Chain::Ethereum
            | Chain::Bnb
            | Chain::Avalanche
            | Chain::Xrp
            | Chain::Bat => SigningAlgorithm::EcdsaSecp256k1,
        }
    }

    /// EVM-compatible chains sharing the personal-message signing path.
    pub fn is_evm(&self) -> bool {
        matches!(self, Chain::Ethereum | Chain::Bnb | Chain::Avalanche | Chain::Bat)
    }

    /// Whether token transfers via coin selection are defined for the chain.
    pub fn supports_transfers(&self) -> bool {
        matches!(self, Chain::Cardano)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Chain::ALL
            .into_iter()
            .find(|c| c.as_str() == lower || (lower == "avax" && *c == Chain::Avalanche))
            .ok_or_else(|| RelayError::InputValidation(format!("Unknown chain '{}'", s)))
    }
}

/// Cardano payment-key derivation path for a custody account.
pub fn cardano_derivation_path(account: &str) -> RelayResult<Vec<u32>> {
    let index: u32 = account.parse().map_err(|_| {
        RelayError::InputValidation(format!(
            "Account id '{}' is not a numeric vault index",
            account
        ))
    })?;
    Ok(vec![44, CARDANO_COIN_TYPE, index, 0, 0])
}
