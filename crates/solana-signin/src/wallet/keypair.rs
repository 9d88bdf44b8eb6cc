/*
[INPUT]:  Ed25519 keypair (base58 seed or keypair) and sign-in requests
[OUTPUT]: Signed Sign-In With Solana outputs and signed messages
[POS]:    Wallet layer - local keypair wallet implementation
[UPDATE]: When key formats or the approval flow change
*/

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::{Result, SignInError, WalletError, WalletErrorCode};
use crate::siws::SignInMessage;
use crate::types::{SignInInput, SignInOutput, SolanaChain, WalletAccount, format_timestamp};

use super::{
    Feature, FeatureMap, SOLANA_SIGN_IN, SOLANA_SIGN_MESSAGE, STANDARD_CONNECT, SignInFeature,
    SignMessageFeature, SignedMessage, Wallet,
};

/// Decides whether a signing request is approved (the wallet's user prompt)
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, message: &str) -> bool;
}

/// Approves every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, _message: &str) -> bool {
        true
    }
}

#[derive(Clone)]
struct KeypairCore {
    signing_key: SigningKey,
    account: WalletAccount,
    origin: Option<String>,
    approver: Arc<dyn Approver>,
}

impl KeypairCore {
    async fn ensure_approved(&self, message: &str) -> std::result::Result<(), WalletError> {
        if self.approver.approve(message).await {
            Ok(())
        } else {
            Err(WalletError::rejected("User rejected the request."))
        }
    }
}

#[async_trait]
impl SignInFeature for KeypairCore {
    async fn sign_in(
        &self,
        mut input: SignInInput,
    ) -> std::result::Result<Vec<SignInOutput>, WalletError> {
        if let Some(address) = input.address.as_deref()
            && address != self.account.address
        {
            return Err(WalletError::with_code(
                WalletErrorCode::Unauthorized,
                format!("Account {address} is not managed by this wallet"),
            ));
        }
        if input.config.issued_at.is_none() {
            input.config.issued_at = Some(format_timestamp(chrono::Utc::now()));
        }

        let text = SignInMessage::from_input(&input, &self.account.address, self.origin.as_deref())
            .map_err(|e| WalletError::with_code(WalletErrorCode::InvalidParams, e.to_string()))?
            .format();
        self.ensure_approved(&text).await?;

        let signature = self.signing_key.sign(text.as_bytes());
        debug!(address = %self.account.address, "signed sign-in message");

        Ok(vec![SignInOutput {
            account: self.account.clone(),
            signed_message: text.into_bytes(),
            signature: signature.to_bytes().to_vec(),
            signature_type: Some("ed25519".to_string()),
        }])
    }
}

#[async_trait]
impl SignMessageFeature for KeypairCore {
    async fn sign_message(
        &self,
        account: &WalletAccount,
        message: &[u8],
    ) -> std::result::Result<SignedMessage, WalletError> {
        if account.address != self.account.address {
            return Err(WalletError::with_code(
                WalletErrorCode::Unauthorized,
                format!("Account {} is not managed by this wallet", account.address),
            ));
        }
        self.ensure_approved(&String::from_utf8_lossy(message)).await?;

        Ok(SignedMessage {
            signed_message: message.to_vec(),
            signature: self.signing_key.sign(message).to_bytes().to_vec(),
        })
    }
}

/// Wallet-standard wallet backed by a single local ed25519 keypair
pub struct KeypairWallet {
    name: String,
    core: Arc<KeypairCore>,
    features: FeatureMap,
}

impl fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("name", &self.name)
            .field("address", &self.core.account.address)
            .field("origin", &self.core.origin)
            .finish_non_exhaustive()
    }
}

impl KeypairWallet {
    /// Create a wallet from a base58-encoded private key.
    ///
    /// Supports a 64-byte keypair or a 32-byte seed.
    pub fn from_base58(private_key_base58: &str) -> Result<Self> {
        let bytes = bs58::decode(private_key_base58.trim())
            .into_vec()
            .map_err(|e| SignInError::Config(format!("Invalid base58 private key: {e}")))?;

        let signing_key = match bytes.len() {
            64 => {
                let keypair: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| SignInError::Config("Invalid keypair bytes".to_string()))?;
                SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| SignInError::Config(format!("Invalid keypair bytes: {e}")))?
            }
            32 => {
                let seed: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| SignInError::Config("Invalid seed bytes".to_string()))?;
                SigningKey::from_bytes(&seed)
            }
            other => {
                return Err(SignInError::Config(format!(
                    "Invalid private key length: expected 32 or 64 bytes, got {other}"
                )));
            }
        };

        Ok(Self::from_signing_key(signing_key))
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let account = WalletAccount::from_public_key(signing_key.verifying_key().to_bytes())
            .with_chains(SolanaChain::ALL)
            .with_features([SOLANA_SIGN_IN, SOLANA_SIGN_MESSAGE]);
        Self::assemble(
            "Keypair Wallet".to_string(),
            KeypairCore {
                signing_key,
                account,
                origin: None,
                approver: Arc::new(AutoApprove),
            },
        )
    }

    fn assemble(name: String, core: KeypairCore) -> Self {
        let core = Arc::new(core);
        let features = FeatureMap::new()
            .with(STANDARD_CONNECT, Feature::Opaque)
            .with_sign_in(core.clone())
            .with_sign_message(core.clone());
        Self {
            name,
            core,
            features,
        }
    }

    fn rebuild(self, update: impl FnOnce(&mut KeypairCore)) -> Self {
        let mut core = Arc::unwrap_or_clone(self.core);
        update(&mut core);
        Self::assemble(self.name, core)
    }

    /// Domain used when a sign-in input does not name one
    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        self.rebuild(|core| core.origin = Some(origin))
    }

    pub fn with_approver(self, approver: Arc<dyn Approver>) -> Self {
        self.rebuild(|core| core.approver = approver)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn account(&self) -> &WalletAccount {
        &self.core.account
    }

    pub fn address(&self) -> &str {
        &self.core.account.address
    }

    /// Base58 encoded 32-byte seed, accepted by [`KeypairWallet::from_base58`]
    pub fn seed_base58(&self) -> String {
        bs58::encode(self.core.signing_key.to_bytes()).into_string()
    }
}

impl Wallet for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn accounts(&self) -> Vec<WalletAccount> {
        vec![self.core.account.clone()]
    }

    fn features(&self) -> &FeatureMap {
        &self.features
    }
}
