/*
[INPUT]:  WalletConnection snapshot, SignInConfig, mutation options
[OUTPUT]: First SignInOutput from the wallet, tracked as mutation state
[POS]:    Sign-in layer - orchestrates the sign-in handshake
[UPDATE]: When lookup, merge or retry behavior changes
*/

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::config::SignInSettings;
use crate::error::{Result, SignInError};
use crate::mutation::{
    AlwaysOnline, Connectivity, Mutation, MutationKey, MutationOptions, MutationSnapshot,
    NetworkMode, OperationState, RetryPolicy,
};
use crate::types::{SignInConfig, SignInInput, SignInOutput};
use crate::wallet::{SOLANA_SIGN_IN, Wallet, WalletConnection, sign_in_feature};

/// Namespace for mutation keys issued by this crate
pub const CLIENT_KEY: &str = "solana-signin";

pub fn sign_in_mutation_key() -> MutationKey {
    MutationKey::new([CLIENT_KEY, "signIn"])
}

/// Offline-first, three retries with capped exponential backoff
pub fn default_options() -> MutationOptions {
    MutationOptions::default()
        .with_key(sign_in_mutation_key())
        .network_mode(NetworkMode::OfflineFirst)
        .retry(RetryPolicy::default())
}

/// Sign-in handshake with the connected wallet, plus its tracked state.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct SignInOperation {
    connection: Arc<dyn WalletConnection>,
    config: Option<SignInConfig>,
    mutation: Arc<Mutation<SignInOutput, SignInError>>,
}

impl std::fmt::Debug for SignInOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInOperation")
            .field("connection", &self.connection.current())
            .field("config", &self.config)
            .field("mutation", &self.mutation)
            .finish()
    }
}

impl SignInOperation {
    /// Create an operation with [`default_options`]
    pub fn new(connection: Arc<dyn WalletConnection>, config: Option<SignInConfig>) -> Self {
        Self::with_options(connection, config, default_options(), Arc::new(AlwaysOnline))
    }

    pub fn with_options(
        connection: Arc<dyn WalletConnection>,
        config: Option<SignInConfig>,
        options: MutationOptions,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            connection,
            config,
            mutation: Arc::new(Mutation::with_connectivity(options, connectivity)),
        }
    }

    /// Create an operation from loaded settings
    pub fn from_settings(
        connection: Arc<dyn WalletConnection>,
        settings: &SignInSettings,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self::with_options(
            connection,
            Some(settings.sign_in.clone()),
            settings.mutation_options(),
            connectivity,
        )
    }

    /// Run the sign-in handshake.
    ///
    /// A missing wallet or account fails without entering the pending state
    /// or contacting the wallet. Once started, the attempts run to completion
    /// even if the returned future is dropped.
    pub async fn sign_in(&self) -> Result<SignInOutput> {
        let snapshot = self.connection.current();
        let Some(wallet) = snapshot.wallet else {
            return Err(self.mutation.reject(SignInError::NotConnected).await);
        };
        let Some(account) = snapshot.account else {
            return Err(self.mutation.reject(SignInError::NoAccount).await);
        };

        let input = self.request_for(&account.address);
        self.mutation
            .mutate_detached(move || attempt_sign_in(wallet.clone(), input.clone()))
            .await
    }

    /// The request sent to the wallet for `address`
    pub fn request_for(&self, address: &str) -> SignInInput {
        self.config.clone().unwrap_or_default().to_input(address)
    }

    /// Last failure, if the operation is in the failure state
    pub fn error(&self) -> Option<SignInError> {
        self.mutation.error()
    }

    pub fn is_loading(&self) -> bool {
        self.mutation.is_pending()
    }

    /// Last successful output, if the operation is in the success state
    pub fn output(&self) -> Option<SignInOutput> {
        self.mutation.data()
    }

    pub fn state(&self) -> OperationState<SignInOutput, SignInError> {
        self.mutation.snapshot().state
    }

    pub fn snapshot(&self) -> MutationSnapshot<SignInOutput, SignInError> {
        self.mutation.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationSnapshot<SignInOutput, SignInError>> {
        self.mutation.subscribe()
    }

    pub fn failure_count(&self) -> u32 {
        self.mutation.snapshot().failure_count
    }

    pub fn is_paused(&self) -> bool {
        self.mutation.snapshot().is_paused
    }

    pub fn reset(&self) {
        self.mutation.reset();
    }

    pub fn config(&self) -> Option<&SignInConfig> {
        self.config.as_ref()
    }

    pub fn options(&self) -> &MutationOptions {
        self.mutation.options()
    }
}

async fn attempt_sign_in(wallet: Arc<dyn Wallet>, input: SignInInput) -> Result<SignInOutput> {
    let feature = sign_in_feature(wallet.as_ref()).ok_or_else(|| SignInError::UnsupportedFeature {
        feature: SOLANA_SIGN_IN.to_string(),
    })?;

    let outputs = feature.sign_in(input).await?;
    let returned = outputs.len();
    // Only the first account's result is used.
    let output = outputs.into_iter().next().ok_or(SignInError::EmptyResponse)?;
    if returned > 1 {
        debug!(
            wallet = wallet.name(),
            ignored = returned - 1,
            "wallet returned multiple sign-in results; keeping the first"
        );
    }
    Ok(output)
}
