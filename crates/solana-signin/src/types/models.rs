/*
[INPUT]:  Wallet-standard `solana:signIn` input/output schema
[OUTPUT]: Account, sign-in config/input and sign-in output models
[POS]:    Data layer - request and response models
[UPDATE]: When the sign-in feature schema changes
*/

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::SolanaChain;

/// Account exposed by a connected wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    /// Base58 encoded public key
    pub address: String,
    #[serde(default)]
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl WalletAccount {
    pub fn new(address: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            public_key,
            chains: Vec::new(),
            features: Vec::new(),
            label: None,
            icon: None,
        }
    }

    /// Build an account whose address is the base58 form of `public_key`
    pub fn from_public_key(public_key: [u8; 32]) -> Self {
        Self::new(bs58::encode(public_key).into_string(), public_key.to_vec())
    }

    pub fn with_chains(mut self, chains: impl IntoIterator<Item = SolanaChain>) -> Self {
        self.chains = chains.into_iter().map(|chain| chain.id().to_string()).collect();
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Caller-supplied sign-in parameters.
///
/// Mirrors the wallet-standard sign-in input without `address`, which is
/// always taken from the active account. Unknown fields are ignored when
/// deserializing, so a stray `address` in a config file has no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl SignInConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_chain(mut self, chain: SolanaChain) -> Self {
        self.chain_id = Some(chain.reference().to_string());
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }

    /// Stamp `issued_at` with `now` and `expiration_time` with `now + ttl`
    pub fn valid_for(mut self, now: DateTime<Utc>, ttl: Duration) -> Self {
        self.issued_at = Some(format_timestamp(now));
        self.expiration_time = Some(format_timestamp(now + ttl));
        self
    }

    /// Merge with the active account's address into a wallet request
    pub fn to_input(&self, address: &str) -> SignInInput {
        SignInInput {
            address: Some(address.to_string()),
            config: self.clone(),
        }
    }
}

/// Request passed to a wallet's `solana:signIn` feature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub config: SignInConfig,
}

/// One signed response from a wallet's `solana:signIn` feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutput {
    pub account: WalletAccount,
    pub signed_message: Vec<u8>,
    pub signature: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<String>,
}

impl SignInOutput {
    /// The signed message as text, if it is valid UTF-8
    pub fn message_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.signed_message).ok()
    }

    pub fn signature_base58(&self) -> String {
        bs58::encode(&self.signature).into_string()
    }
}

/// ISO 8601 timestamp with millisecond precision and a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
