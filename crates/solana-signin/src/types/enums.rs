/*
[INPUT]:  Solana wallet-standard chain identifiers
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for wallet communication
[UPDATE]: When new clusters are added to the standard
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SignInError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolanaChain {
    #[serde(rename = "solana:mainnet")]
    Mainnet,
    #[serde(rename = "solana:devnet")]
    Devnet,
    #[serde(rename = "solana:testnet")]
    Testnet,
    #[serde(rename = "solana:localnet")]
    Localnet,
}

impl SolanaChain {
    pub const ALL: [SolanaChain; 4] = [
        SolanaChain::Mainnet,
        SolanaChain::Devnet,
        SolanaChain::Testnet,
        SolanaChain::Localnet,
    ];

    /// Wallet-standard chain identifier, e.g. `solana:mainnet`
    pub fn id(self) -> &'static str {
        match self {
            SolanaChain::Mainnet => "solana:mainnet",
            SolanaChain::Devnet => "solana:devnet",
            SolanaChain::Testnet => "solana:testnet",
            SolanaChain::Localnet => "solana:localnet",
        }
    }

    /// Chain ID as written in a sign-in message (`mainnet`, `devnet`, ...)
    pub fn reference(self) -> &'static str {
        let id = self.id();
        &id["solana:".len()..]
    }
}

impl fmt::Display for SolanaChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SolanaChain {
    type Err = SignInError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|chain| chain.id() == value || chain.reference() == value)
            .ok_or_else(|| SignInError::Config(format!("Unknown Solana chain: {value}")))
    }
}
