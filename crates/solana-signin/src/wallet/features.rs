/*
[INPUT]:  Wallet handle and a wallet-standard feature identifier
[OUTPUT]: Typed feature implementation, if the wallet provides it
[POS]:    Wallet layer - capability registry
[UPDATE]: When supporting additional wallet-standard features
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WalletError;
use crate::types::{SignInInput, SignInOutput, WalletAccount};

pub const STANDARD_CONNECT: &str = "standard:connect";
pub const STANDARD_DISCONNECT: &str = "standard:disconnect";
pub const SOLANA_SIGN_IN: &str = "solana:signIn";
pub const SOLANA_SIGN_MESSAGE: &str = "solana:signMessage";

/// `solana:signIn` feature
///
/// The trait is async because the wallet usually waits on a user prompt.
#[async_trait]
pub trait SignInFeature: Send + Sync {
    /// Sign in with the given input; wallets may return one output per account
    async fn sign_in(&self, input: SignInInput) -> Result<Vec<SignInOutput>, WalletError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signed_message: Vec<u8>,
    pub signature: Vec<u8>,
}

/// `solana:signMessage` feature
#[async_trait]
pub trait SignMessageFeature: Send + Sync {
    async fn sign_message(
        &self,
        account: &WalletAccount,
        message: &[u8],
    ) -> Result<SignedMessage, WalletError>;
}

/// A feature implementation registered under a string identifier
#[derive(Clone)]
pub enum Feature {
    SignIn(Arc<dyn SignInFeature>),
    SignMessage(Arc<dyn SignMessageFeature>),
    /// Advertised but not modelled here (e.g. `standard:connect`)
    Opaque,
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::SignIn(_) => f.write_str("Feature::SignIn"),
            Feature::SignMessage(_) => f.write_str("Feature::SignMessage"),
            Feature::Opaque => f.write_str("Feature::Opaque"),
        }
    }
}

/// Features a wallet exposes, keyed by wallet-standard identifier
#[derive(Debug, Clone, Default)]
pub struct FeatureMap {
    entries: HashMap<String, Feature>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, feature: Feature) {
        self.entries.insert(key.into(), feature);
    }

    pub fn with(mut self, key: impl Into<String>, feature: Feature) -> Self {
        self.insert(key, feature);
        self
    }

    pub fn with_sign_in(self, feature: Arc<dyn SignInFeature>) -> Self {
        self.with(SOLANA_SIGN_IN, Feature::SignIn(feature))
    }

    pub fn with_sign_message(self, feature: Arc<dyn SignMessageFeature>) -> Self {
        self.with(SOLANA_SIGN_MESSAGE, Feature::SignMessage(feature))
    }

    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered identifiers, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// A wallet-standard wallet
pub trait Wallet: Send + Sync {
    fn name(&self) -> &str;

    fn accounts(&self) -> Vec<WalletAccount>;

    fn features(&self) -> &FeatureMap;
}

/// Look up a feature on `wallet` by identifier
pub fn get_wallet_feature(wallet: &dyn Wallet, key: &str) -> Option<Feature> {
    wallet.features().get(key).cloned()
}

/// The wallet's `solana:signIn` implementation
pub fn sign_in_feature(wallet: &dyn Wallet) -> Option<Arc<dyn SignInFeature>> {
    match get_wallet_feature(wallet, SOLANA_SIGN_IN)? {
        Feature::SignIn(feature) => Some(feature),
        _ => None,
    }
}

/// The wallet's `solana:signMessage` implementation
pub fn sign_message_feature(wallet: &dyn Wallet) -> Option<Arc<dyn SignMessageFeature>> {
    match get_wallet_feature(wallet, SOLANA_SIGN_MESSAGE)? {
        Feature::SignMessage(feature) => Some(feature),
        _ => None,
    }
}
